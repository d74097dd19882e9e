use serde::{
    Deserialize,
    Serialize,
};

/// Display copy of a contestant, frozen into each match record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestantRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub timestamp: i64,
    pub contestant_a: ContestantRef,
    pub contestant_b: ContestantRef,
    /// `None` for a draw.
    #[serde(default)]
    pub winner_name: Option<String>,
    #[serde(default)]
    pub winner_id: Option<String>,
    pub move_count: u32,
    #[serde(default)]
    pub storage_blob_id: Option<String>,
    pub match_sequence_number: u32,
}

impl MatchRecord {
    pub fn is_draw(&self) -> bool {
        self.winner_name.is_none()
    }
}

/// A completed match before it is given an id and sequence number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMatch {
    pub contestant_a: ContestantRef,
    pub contestant_b: ContestantRef,
    pub winner: Option<ContestantRef>,
    pub move_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    Pending,
    Win,
    Loss,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetRecord {
    pub contestant_id: String,
    pub contestant_name: String,
    pub amount: f64,
    pub odds: f64,
    pub potential_payout: f64,
    pub timestamp: i64,
    pub transaction_ref: String,
    pub result: BetResult,
    #[serde(default)]
    pub payout: f64,
}

impl BetRecord {
    pub fn is_pending(&self) -> bool {
        self.result == BetResult::Pending
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewBet {
    pub contestant_id: String,
    pub contestant_name: String,
    pub amount: f64,
    pub odds: f64,
    pub potential_payout: f64,
    pub transaction_ref: String,
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn bet_record__serializes_fields_in_camel_case() {
        // given
        let bet = BetRecord {
            contestant_id: "bot_alpha".to_string(),
            contestant_name: "Alpha".to_string(),
            amount: 10.0,
            odds: 0.5,
            potential_payout: 20.0,
            timestamp: 1,
            transaction_ref: "0xabc".to_string(),
            result: BetResult::Pending,
            payout: 0.0,
        };

        // when
        let value = serde_json::to_value(&bet).unwrap();

        // then
        assert_eq!(value["contestantId"], "bot_alpha");
        assert_eq!(value["potentialPayout"], 20.0);
        assert_eq!(value["transactionRef"], "0xabc");
        assert_eq!(value["result"], "pending");
    }

    #[test]
    fn match_record__missing_optional_fields_default() {
        // given
        let raw = r#"{
            "id": "match_1",
            "timestamp": 5,
            "contestantA": {"id": "bot_alpha", "name": "Alpha"},
            "contestantB": {"id": "bot_beta", "name": "Beta"},
            "moveCount": 9,
            "matchSequenceNumber": 1
        }"#;

        // when
        let record: MatchRecord = serde_json::from_str(raw).unwrap();

        // then
        assert!(record.is_draw());
        assert!(record.storage_blob_id.is_none());
        assert_eq!(record.contestant_a.avatar, "");
    }
}
