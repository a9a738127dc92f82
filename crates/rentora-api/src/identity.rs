//! Request identity extractor
//!
//! Authentication happens at the gateway in front of this service; it
//! forwards the verified identity as headers. The extractor turns those
//! headers into an `Actor` for the access policy:
//!
//! - `x-user-id`    user id (required)
//! - `x-user-role`  one of customer, agency_admin, agency_staff,
//!                  platform_admin (required)
//! - `x-agency-id`  agency membership (required for agency roles)

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use rentora_core::{
    models::{Actor, Role},
    AppError,
};
use tracing::debug;

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Verified acting user attached to a request
#[derive(Debug, Clone)]
pub struct Identity(pub Actor);

impl Identity {
    /// The actor this identity wraps
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}

fn extract_actor(req: &HttpRequest) -> Result<Actor, AppError> {
    let user_id = header_value(req, "x-user-id")
        .ok_or_else(|| AppError::Unauthorized("Missing x-user-id header".to_string()))?
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".to_string()))?;

    let role_str = header_value(req, "x-user-role")
        .ok_or_else(|| AppError::Unauthorized("Missing x-user-role header".to_string()))?;
    let role = Role::from_str(role_str)
        .ok_or_else(|| AppError::Unauthorized(format!("Unknown role '{}'", role_str)))?;

    let agency_id = match header_value(req, "x-agency-id") {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| AppError::Unauthorized("Invalid x-agency-id header".to_string()))?,
        ),
        None => None,
    };

    if matches!(role, Role::AgencyAdmin | Role::AgencyStaff) && agency_id.is_none() {
        return Err(AppError::Unauthorized(
            "Agency roles require the x-agency-id header".to_string(),
        ));
    }

    Ok(Actor {
        user_id,
        role,
        agency_id,
    })
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = extract_actor(req);
        if let Ok(actor) = &result {
            debug!(user_id = actor.user_id, role = %actor.role, "Request identity resolved");
        }
        ready(result.map(Identity))
    }
}
