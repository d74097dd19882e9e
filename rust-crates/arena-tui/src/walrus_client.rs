use crate::http::HttpTransport;
use chrono::Utc;
use rand::Rng;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use std::fmt;
use tracing::{
    info,
    warn,
};

/// Storage epochs requested for every blob.
pub const EPOCHS: u32 = 1;

pub const DEFAULT_AGGREGATOR_URL: &str = "https://aggregator.walrus-testnet.walrus.space";

/// Public testnet publishers, tried in this order. Any of them may be out of funds.
pub const DEFAULT_PUBLISHERS: [&str; 5] = [
    "https://publisher.walrus-testnet.walrus.space",
    "https://walrus-testnet-publisher.nodes.guru",
    "https://walrus-testnet-publisher.everstake.one",
    "https://publisher.testnet.walrus.atalma.io",
    "https://walrus-testnet-publisher.stakely.io",
];

pub const PLACEHOLDER_PREFIX: &str = "DEMO_";

const PLACEHOLDER_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMove {
    pub position: usize,
    pub player: String,
    pub timestamp: i64,
}

/// The match record published to storage. Field names are part of the stored format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattlePayload {
    pub battle_id: String,
    pub agent1_id: String,
    pub agent2_id: String,
    pub agent1_name: String,
    pub agent2_name: String,
    pub moves: Vec<PayloadMove>,
    /// Row-major cells, 1 or 2 for a piece.
    pub board: Vec<Option<u8>>,
    pub winner: Option<String>,
    pub is_draw: bool,
    pub timestamp: i64,
    #[serde(default)]
    pub game_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishError {
    /// The publisher wallet cannot pay for storage.
    InsufficientBalance { status: u16, body: String },
    Rejected { status: u16, body: String },
    Transport(String),
    MissingBlobId(String),
    Encode(String),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::InsufficientBalance { status, body } => {
                write!(f, "publisher out of funds ({status}): {body}")
            }
            PublishError::Rejected { status, body } => {
                write!(f, "publisher rejected blob ({status}): {body}")
            }
            PublishError::Transport(err) => write!(f, "publisher unreachable: {err}"),
            PublishError::MissingBlobId(body) => {
                write!(f, "no blob id in publisher response: {body}")
            }
            PublishError::Encode(err) => write!(f, "could not encode payload: {err}"),
        }
    }
}

impl std::error::Error for PublishError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishFailure {
    pub attempts: usize,
    pub last_error: Option<PublishError>,
}

impl fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_error {
            Some(err) => write!(
                f,
                "all {} publishers failed; last error: {err}",
                self.attempts
            ),
            None => write!(f, "no publishers configured"),
        }
    }
}

impl std::error::Error for PublishFailure {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiptKind {
    Stored,
    Placeholder { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobReceipt {
    pub blob_id: String,
    pub kind: ReceiptKind,
}

impl BlobReceipt {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, ReceiptKind::Placeholder { .. })
    }
}

pub fn classify_failure(status: u16, body: &str) -> PublishError {
    if body.contains("insufficient balance") || body.contains("could not find SUI") {
        PublishError::InsufficientBalance {
            status,
            body: body.to_string(),
        }
    } else {
        PublishError::Rejected {
            status,
            body: body.to_string(),
        }
    }
}

/// Reads the blob id from any of the response shapes publishers return.
pub fn extract_blob_id(response: &Value) -> Option<String> {
    [
        "/newlyCreated/blobObject/blobId",
        "/newlyCreated/blobId",
        "/alreadyCertified/blobId",
        "/blobId",
    ]
    .iter()
    .filter_map(|pointer| response.pointer(pointer).and_then(Value::as_str))
    .find(|blob_id| !blob_id.is_empty())
    .map(str::to_string)
}

pub fn placeholder_blob_id<R: Rng + ?Sized>(timestamp_millis: i64, rng: &mut R) -> String {
    let suffix: String = (0..PLACEHOLDER_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{PLACEHOLDER_PREFIX}{timestamp_millis}_{suffix}")
}

pub fn is_placeholder_blob_id(blob_id: &str) -> bool {
    blob_id.starts_with(PLACEHOLDER_PREFIX)
}

#[derive(Clone)]
pub struct WalrusClient<T> {
    transport: T,
    publishers: Vec<String>,
    aggregator_url: String,
}

impl<T: HttpTransport> WalrusClient<T> {
    pub fn new(
        transport: T,
        publishers: Vec<String>,
        aggregator_url: impl Into<String>,
    ) -> Self {
        let publishers = publishers
            .into_iter()
            .map(|url| url.trim_end_matches('/').to_string())
            .collect();
        let aggregator_url = aggregator_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            publishers,
            aggregator_url,
        }
    }

    pub fn publishers(&self) -> &[String] {
        &self.publishers
    }

    pub fn blob_url(&self, blob_id: &str) -> String {
        format!("{}/v1/{}", self.aggregator_url, blob_id)
    }

    async fn publish_to(&self, publisher: &str, body: &str) -> Result<String, PublishError> {
        let url = format!("{publisher}/v1/blobs?epochs={EPOCHS}");
        let response = self
            .transport
            .put(&url, body.to_string())
            .await
            .map_err(|err| PublishError::Transport(format!("{err:#}")))?;
        if !response.is_success() {
            return Err(classify_failure(response.status, &response.body));
        }
        let value: Value = serde_json::from_str(&response.body)
            .map_err(|_| PublishError::MissingBlobId(response.body.clone()))?;
        extract_blob_id(&value).ok_or(PublishError::MissingBlobId(response.body))
    }

    /// Tries each publisher once, in order, and returns the first blob id obtained.
    pub async fn publish(&self, payload: &BattlePayload) -> Result<String, PublishFailure> {
        let body = serde_json::to_string(payload).map_err(|err| PublishFailure {
            attempts: 0,
            last_error: Some(PublishError::Encode(err.to_string())),
        })?;
        let total = self.publishers.len();
        let mut last_error = None;
        for (index, publisher) in self.publishers.iter().enumerate() {
            match self.publish_to(publisher, &body).await {
                Ok(blob_id) => {
                    info!(
                        battle_id = %payload.battle_id,
                        %blob_id,
                        attempt = index + 1,
                        "battle stored"
                    );
                    return Ok(blob_id);
                }
                Err(err) => {
                    warn!(
                        %publisher,
                        attempt = index + 1,
                        total,
                        %err,
                        "publisher failed; trying next"
                    );
                    last_error = Some(err);
                }
            }
        }
        Err(PublishFailure {
            attempts: total,
            last_error,
        })
    }

    /// Never fails: when every publisher fails the match gets a local placeholder id.
    pub async fn publish_or_placeholder(&self, payload: &BattlePayload) -> BlobReceipt {
        match self.publish(payload).await {
            Ok(blob_id) => BlobReceipt {
                blob_id,
                kind: ReceiptKind::Stored,
            },
            Err(failure) => {
                let blob_id =
                    placeholder_blob_id(Utc::now().timestamp_millis(), &mut rand::rng());
                warn!(
                    battle_id = %payload.battle_id,
                    %blob_id,
                    %failure,
                    "storage unavailable; using placeholder id"
                );
                BlobReceipt {
                    blob_id,
                    kind: ReceiptKind::Placeholder {
                        reason: failure.to_string(),
                    },
                }
            }
        }
    }

    /// Single attempt against the aggregator. Missing blobs and errors are `None`.
    pub async fn fetch(&self, blob_id: &str) -> Option<BattlePayload> {
        let url = self.blob_url(blob_id);
        let response = match self.transport.get(&url).await {
            Ok(response) => response,
            Err(err) => {
                warn!(blob_id, err = %format!("{err:#}"), "blob retrieval failed");
                return None;
            }
        };
        if !response.is_success() {
            warn!(
                blob_id,
                status = response.status,
                body = %response.body,
                "aggregator did not return blob"
            );
            return None;
        }
        match serde_json::from_str(&response.body) {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!(blob_id, %err, "blob is not a battle payload");
                None
            }
        }
    }
}
