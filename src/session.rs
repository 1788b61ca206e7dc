//! Session establishment
//!
//! One authenticated session is created up front and reused for every call.
//! Any failure here aborts the whole run.

use std::collections::BTreeMap;

use anyhow::{Context as _, Result, bail};
use log::info;
use xmlrpc::Value;

use crate::{
    config::ConnectionConfig,
    rpc::{RecordId, RpcEndpoint, is_falsy, record_id},
};

/// Credentials of an authenticated user
#[derive(Clone)]
pub struct Session {
    pub uid: RecordId,
    pub database: String,
    pub password: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("uid", &self.uid)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

/// Version information reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    pub server_version: String,
}

impl ServerVersion {
    fn from_value(value: &Value) -> Self {
        let server_version = match value {
            Value::Struct(fields) => match fields.get("server_version") {
                Some(Value::String(version)) => version.clone(),
                _ => "Unknown".to_string(),
            },
            _ => "Unknown".to_string(),
        };
        Self { server_version }
    }
}

/// Probe the server version and authenticate against `common`
pub fn establish_session(
    common: &impl RpcEndpoint,
    connection: &ConnectionConfig,
) -> Result<Session> {
    info!("Connecting to {}", connection.url);

    let version = common
        .call("version", vec![])
        .context("connection error")?;
    // Informational only, no version gate.
    let version = ServerVersion::from_value(&version);
    info!("Connected to Odoo {}", version.server_version);

    let uid = common
        .call(
            "authenticate",
            vec![
                Value::String(connection.database.clone()),
                Value::String(connection.login.clone()),
                Value::String(connection.password.clone()),
                Value::Struct(BTreeMap::new()),
            ],
        )
        .context("connection error")?;

    if is_falsy(&uid) {
        bail!(
            "authentication failed for '{}' on database '{}', check credentials and API key",
            connection.login,
            connection.database
        );
    }
    let uid = record_id(&uid).context("unexpected authentication result")?;
    info!("Authenticated, user id {uid}");

    Ok(Session {
        uid,
        database: connection.database.clone(),
        password: connection.password.clone(),
    })
}
