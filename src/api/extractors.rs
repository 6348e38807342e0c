use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::domain::identity::{Caller, Role};
use crate::services::OrderServiceError;

/// Set by the authentication layer in front of this service
pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Caller identity taken from the trusted identity headers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCaller(pub Caller);

impl AuthenticatedCaller {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }
}

impl FromRequest for AuthenticatedCaller {
    type Error = OrderServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(caller_from_headers(req.headers()).map(AuthenticatedCaller))
    }
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, OrderServiceError> {
    let user_id = header(headers, USER_ID_HEADER)?
        .parse::<Uuid>()
        .map_err(|_| OrderServiceError::InvalidInput(format!("{} is not a UUID", USER_ID_HEADER)))?;

    let role = header(headers, USER_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(|e| OrderServiceError::InvalidInput(e.to_string()))?;

    Ok(Caller { user_id, role })
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, OrderServiceError> {
    headers
        .get(name)
        .ok_or_else(|| OrderServiceError::InvalidInput(format!("missing {} header", name)))?
        .to_str()
        .map_err(|_| OrderServiceError::InvalidInput(format!("malformed {} header", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_headers_resolve_to_caller() {
        let user_id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, user_id.to_string()))
            .insert_header((USER_ROLE_HEADER, "administrator"))
            .to_http_request();

        let caller = caller_from_headers(req.headers()).unwrap();
        assert_eq!(caller, Caller::administrator(user_id));
    }

    #[test]
    fn test_missing_or_malformed_headers_are_invalid_input() {
        let missing_role = TestRequest::default()
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .to_http_request();
        assert!(matches!(
            caller_from_headers(missing_role.headers()),
            Err(OrderServiceError::InvalidInput(_))
        ));

        let bad_id = TestRequest::default()
            .insert_header((USER_ID_HEADER, "42"))
            .insert_header((USER_ROLE_HEADER, "customer"))
            .to_http_request();
        assert!(matches!(
            caller_from_headers(bad_id.headers()),
            Err(OrderServiceError::InvalidInput(_))
        ));

        let bad_role = TestRequest::default()
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .insert_header((USER_ROLE_HEADER, "root"))
            .to_http_request();
        assert!(matches!(
            caller_from_headers(bad_role.headers()),
            Err(OrderServiceError::InvalidInput(_))
        ));
    }
}
