use crate::http::HttpTransport;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde_json::{
    Map,
    Value,
    json,
};

/// The `content.fields` map of an on-chain object, keyed by Move field name.
pub type ObjectFields = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    pub strategy: String,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub total_score: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleRecord {
    pub id: String,
    pub agent1_id: String,
    pub agent2_id: String,
    pub board: Vec<u64>,
    pub current_turn: u64,
    pub winner: u64,
    pub move_count: u64,
    pub walrus_blob_id: String,
    pub is_complete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TournamentRecord {
    pub id: String,
    pub name: String,
    pub agent_ids: Vec<String>,
    pub battle_ids: Vec<String>,
    pub settled: bool,
    pub winner_agent_id: String,
    pub total_battles: u64,
    pub walrus_tournament_blob: String,
    pub creator: String,
}

#[derive(Clone)]
pub struct SuiClient<T> {
    transport: T,
    rpc_url: String,
}

impl<T: HttpTransport> SuiClient<T> {
    pub fn new(transport: T, rpc_url: impl Into<String>) -> Self {
        Self {
            transport,
            rpc_url: rpc_url.into(),
        }
    }

    /// `sui_getObject` with content. `None` when the object does not exist or
    /// carries no Move fields.
    pub async fn get_object(&self, object_id: &str) -> Result<Option<ObjectFields>> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "sui_getObject",
            "params": [object_id, { "showContent": true }],
        });
        let response = self
            .transport
            .post_json(&self.rpc_url, &request)
            .await
            .wrap_err("sui rpc request failed")?;
        if !response.is_success() {
            return Err(eyre!(
                "sui rpc responded with {} for {object_id}: {}",
                response.status,
                response.body
            ));
        }
        let value: Value =
            serde_json::from_str(&response.body).wrap_err("invalid sui rpc payload")?;
        if let Some(error) = value.get("error") {
            return Err(eyre!("sui rpc error for {object_id}: {error}"));
        }
        Ok(value
            .pointer("/result/data/content/fields")
            .and_then(Value::as_object)
            .cloned())
    }

    pub async fn agent(&self, object_id: &str) -> Result<Option<AgentRecord>> {
        let Some(fields) = self.get_object(object_id).await? else {
            return Ok(None);
        };
        Ok(Some(AgentRecord {
            id: object_id.to_string(),
            name: field_string(&fields, "name"),
            strategy: field_string(&fields, "strategy"),
            wins: field_u64(&fields, "wins"),
            losses: field_u64(&fields, "losses"),
            draws: field_u64(&fields, "draws"),
            total_score: field_u64(&fields, "total_score"),
        }))
    }

    pub async fn battle(&self, object_id: &str) -> Result<Option<BattleRecord>> {
        let Some(fields) = self.get_object(object_id).await? else {
            return Ok(None);
        };
        let board = fields
            .get("board")
            .and_then(Value::as_array)
            .map(|cells| cells.iter().map(value_u64).collect())
            .unwrap_or_default();
        Ok(Some(BattleRecord {
            id: object_id.to_string(),
            agent1_id: field_string(&fields, "agent1_id"),
            agent2_id: field_string(&fields, "agent2_id"),
            board,
            current_turn: field_u64(&fields, "current_turn"),
            winner: field_u64(&fields, "winner"),
            move_count: field_u64(&fields, "move_count"),
            walrus_blob_id: field_string(&fields, "walrus_blob_id"),
            is_complete: field_bool(&fields, "is_complete"),
        }))
    }

    pub async fn tournament(&self, object_id: &str) -> Result<Option<TournamentRecord>> {
        let Some(fields) = self.get_object(object_id).await? else {
            return Ok(None);
        };
        Ok(Some(TournamentRecord {
            id: object_id.to_string(),
            name: field_string(&fields, "name"),
            agent_ids: field_strings(&fields, "agent_ids"),
            battle_ids: field_strings(&fields, "battle_ids"),
            settled: field_bool(&fields, "settled"),
            winner_agent_id: field_string(&fields, "winner_agent_id"),
            total_battles: field_u64(&fields, "total_battles"),
            walrus_tournament_blob: field_string(&fields, "walrus_tournament_blob"),
            creator: field_string(&fields, "creator"),
        }))
    }
}

// u64 fields arrive as decimal strings
fn value_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or_default(),
        Value::String(s) => s.parse().unwrap_or_default(),
        _ => 0,
    }
}

fn value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // vector<u8> fields holding text
        Value::Array(bytes) => {
            let bytes: Vec<u8> = bytes
                .iter()
                .filter_map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            String::from_utf8_lossy(&bytes).into_owned()
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn field_u64(fields: &ObjectFields, key: &str) -> u64 {
    fields.get(key).map(value_u64).unwrap_or_default()
}

fn field_string(fields: &ObjectFields, key: &str) -> String {
    fields.get(key).map(value_string).unwrap_or_default()
}

fn field_bool(fields: &ObjectFields, key: &str) -> bool {
    fields.get(key).and_then(Value::as_bool).unwrap_or_default()
}

fn field_strings(fields: &ObjectFields, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(value_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::test_helpers::ScriptedTransport;

    const RPC_URL: &str = "https://fullnode.testnet.sui.io:443";

    fn object_response(fields: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "data": {
                    "objectId": "0xabc",
                    "content": { "dataType": "moveObject", "fields": fields }
                }
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn get_object__posts_get_object_request_with_content() {
        // given
        let transport = ScriptedTransport::new()
            .respond(200, &object_response(json!({ "name": "Alpha" })));
        let sut = SuiClient::new(transport.clone(), RPC_URL);

        // when
        let fields = sut.get_object("0xabc").await.unwrap().unwrap();

        // then
        assert_eq!(fields["name"], "Alpha");
        let sent: Value = serde_json::from_str(&transport.requests()[0].body).unwrap();
        assert_eq!(sent["method"], "sui_getObject");
        assert_eq!(sent["params"][0], "0xabc");
        assert_eq!(sent["params"][1]["showContent"], true);
        assert_eq!(transport.requests()[0].url, RPC_URL);
    }

    #[tokio::test]
    async fn get_object__missing_object_is_none() {
        // given
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "error": { "code": "notExists", "object_id": "0xabc" } }
        })
        .to_string();
        let sut = SuiClient::new(ScriptedTransport::new().respond(200, &body), RPC_URL);

        // when
        let fields = sut.get_object("0xabc").await.unwrap();

        // then
        assert!(fields.is_none());
    }

    #[tokio::test]
    async fn get_object__rpc_error_is_err() {
        // given
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "invalid params" }
        })
        .to_string();
        let sut = SuiClient::new(ScriptedTransport::new().respond(200, &body), RPC_URL);

        // when
        let result = sut.get_object("zz").await;

        // then
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn agent__maps_string_encoded_counters() {
        // given
        let fields = json!({
            "name": "Alpha",
            "strategy": "center",
            "wins": "7",
            "losses": "2",
            "draws": 1,
            "total_score": "23"
        });
        let sut = SuiClient::new(
            ScriptedTransport::new().respond(200, &object_response(fields)),
            RPC_URL,
        );

        // when
        let agent = sut.agent("0xagent").await.unwrap().unwrap();

        // then
        assert_eq!(
            agent,
            AgentRecord {
                id: "0xagent".to_string(),
                name: "Alpha".to_string(),
                strategy: "center".to_string(),
                wins: 7,
                losses: 2,
                draws: 1,
                total_score: 23,
            }
        );
    }

    #[tokio::test]
    async fn battle__decodes_byte_vector_blob_id() {
        // given
        let fields = json!({
            "agent1_id": "0x1",
            "agent2_id": "0x2",
            "board": [0, 1, 2, 0, 0, 0, 0, 0, 0],
            "current_turn": 1,
            "winner": 0,
            "move_count": "2",
            "walrus_blob_id": [98, 108, 111, 98],
            "is_complete": false
        });
        let sut = SuiClient::new(
            ScriptedTransport::new().respond(200, &object_response(fields)),
            RPC_URL,
        );

        // when
        let battle = sut.battle("0xbattle").await.unwrap().unwrap();

        // then
        assert_eq!(&battle.board[1..3], &[1, 2]);
        assert_eq!(battle.move_count, 2);
        assert_eq!(battle.walrus_blob_id, "blob");
        assert!(!battle.is_complete);
    }

    #[tokio::test]
    async fn tournament__maps_id_lists() {
        // given
        let fields = json!({
            "name": "Weekly",
            "agent_ids": ["0x1", "0x2"],
            "battle_ids": ["0x9"],
            "settled": true,
            "winner_agent_id": "0x1",
            "total_battles": "1",
            "walrus_tournament_blob": "",
            "creator": "0xcreator"
        });
        let sut = SuiClient::new(
            ScriptedTransport::new().respond(200, &object_response(fields)),
            RPC_URL,
        );

        // when
        let tournament = sut.tournament("0xt").await.unwrap().unwrap();

        // then
        assert_eq!(tournament.agent_ids, vec!["0x1", "0x2"]);
        assert_eq!(tournament.battle_ids, vec!["0x9"]);
        assert!(tournament.settled);
        assert_eq!(tournament.total_battles, 1);
    }
}
