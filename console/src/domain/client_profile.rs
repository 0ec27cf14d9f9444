//! Client profile: the client record plus its address and kin histories.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::domain::gate::ActionGate;
use crate::domain::history::HistorySplit;
use crate::domain::panel::{PanelError, require_text};
use crate::domain::permissions::{Action, Resource};
use crate::domain::ports::{ResourceApi, ResourcePath};
use crate::domain::records::{Address, ApiRecord, Client, Kin, KinDraft, PostalAddress};

/// Client with its current and past addresses and next of kin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientProfile {
    /// Client record.
    pub client: Client,
    /// Address history.
    pub addresses: HistorySplit<Address>,
    /// Next-of-kin history.
    pub kins: HistorySplit<Kin>,
}

fn client_path(client_id: &str) -> ResourcePath {
    ResourcePath::new("clients").child(client_id)
}

/// Fetch a client and split its histories.
///
/// A failed client fetch aborts; a failed history fetch is logged and shows
/// as an empty history.
///
/// # Errors
///
/// Fails when viewing clients is denied or the client cannot be fetched.
pub async fn load_client_profile(
    api: &dyn ResourceApi,
    gate: &ActionGate,
    client_id: &str,
) -> Result<ClientProfile, PanelError> {
    gate.authorize(Resource::Client, Action::View)?;
    let body = api.get(&client_path(client_id)).await.map_err(|err| {
        gate.feedback().alert(&err.to_string());
        PanelError::Api(err)
    })?;
    let client = Client::from_value(body.get("client").unwrap_or(&body));
    let addresses = history::<Address>(api, client_id, "addresses").await;
    let kins = history::<Kin>(api, client_id, "kins").await;
    Ok(ClientProfile {
        client,
        addresses: HistorySplit::from_entries(addresses),
        kins: HistorySplit::from_entries(kins),
    })
}

async fn history<T: ApiRecord>(api: &dyn ResourceApi, client_id: &str, kind: &'static str) -> Vec<T> {
    match api.get(&client_path(client_id).child(kind)).await {
        Ok(body) => T::list_from_value(&body, Some(kind)),
        Err(err) => {
            warn!(client_id, kind, error = %err, "history unavailable");
            Vec::new()
        }
    }
}

/// Append an address; it becomes the client's current address.
///
/// # Errors
///
/// Fails when editing clients is denied or the API call fails.
pub async fn add_address(
    api: &dyn ResourceApi,
    gate: &ActionGate,
    client_id: &str,
    address: &PostalAddress,
) -> Result<Value, PanelError> {
    gate.authorize(Resource::Client, Action::Edit)?;
    let body = postal_body(address);
    append(api, gate, client_id, "addresses", &body).await
}

/// Append a next-of-kin entry.
///
/// # Errors
///
/// Fails when editing clients is denied, the kin name is blank or the API
/// call fails.
pub async fn add_kin(
    api: &dyn ResourceApi,
    gate: &ActionGate,
    client_id: &str,
    kin: &KinDraft,
) -> Result<Value, PanelError> {
    gate.authorize(Resource::Client, Action::Edit)?;
    if let Err(err) = require_text(&kin.name, "Kin name is required") {
        gate.feedback().alert(&err.to_string());
        return Err(PanelError::Validation(err));
    }
    let mut body = postal_body(&kin.postal);
    if let Value::Object(fields) = &mut body {
        fields.insert("kin_name".to_owned(), json!(kin.name));
        fields.insert(
            "kin_relationship".to_owned(),
            optional(&kin.relationship),
        );
        fields.insert("email".to_owned(), json!(kin.email));
    }
    append(api, gate, client_id, "kins", &body).await
}

async fn append(
    api: &dyn ResourceApi,
    gate: &ActionGate,
    client_id: &str,
    kind: &'static str,
    body: &Value,
) -> Result<Value, PanelError> {
    let path = client_path(client_id).child(kind);
    let response = api.post(&path, body).await.map_err(|err| {
        gate.feedback().alert(&err.to_string());
        PanelError::Api(err)
    })?;
    info!(client_id, kind, "history entry added");
    Ok(response)
}

// The history endpoints use the short legacy keys.
fn postal_body(address: &PostalAddress) -> Value {
    json!({
        "house_no": address.house_number,
        "street": address.street_name,
        "city": address.city,
        "country": address.country,
        "postcode": address.postcode,
    })
}

fn optional(text: &str) -> Value {
    if text.trim().is_empty() {
        Value::Null
    } else {
        json!(text)
    }
}
