use std::{
    future::{ready, Ready},
    sync::Arc,
};

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::errors::ApiError;

/// Bearer token payload. The profile fields are optional; when present they
/// feed the confirmation notifications.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub exp: usize,
}

/// Caller identity for handlers behind the Authentication middleware.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// What the middleware concluded about the request's credentials. A missing
/// header and a bad token map onto different status codes, so both outcomes
/// are recorded rather than collapsed.
#[derive(Clone, Debug)]
enum AuthState {
    Missing,
    Invalid,
    Verified(AuthenticatedUser),
}

fn authenticate(req: &ServiceRequest, jwt_secret: &str) -> AuthState {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| value.starts_with("Bearer "))
        .map(|value| &value["Bearer ".len()..]);

    match auth_header {
        Some(token) => {
            let decoding_key = DecodingKey::from_secret(jwt_secret.as_ref());

            match decode::<Claims>(token, &decoding_key, &Validation::default()) {
                Ok(token_data) => {
                    let claims = token_data.claims;
                    debug!("Authenticated user: {}", &claims.sub);
                    AuthState::Verified(AuthenticatedUser {
                        user_id: claims.sub,
                        email: claims.email,
                        full_name: claims.full_name,
                        phone: claims.phone,
                    })
                }
                Err(e) => {
                    warn!("Invalid token: {:?}", e);
                    AuthState::Invalid
                }
            }
        }
        None => AuthState::Missing,
    }
}

fn user_from_state(state: Option<AuthState>) -> Result<AuthenticatedUser, ApiError> {
    match state {
        Some(AuthState::Verified(user)) => Ok(user),
        Some(AuthState::Invalid) => Err(ApiError::InvalidToken),
        _ => Err(ApiError::NoToken),
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(user_from_state(req.extensions().get::<AuthState>().cloned()))
    }
}

pub struct Authentication {
    pub app_config: Arc<AppConfig>,
}

// Middleware factory is `Transform` trait
// `S` - type of the next service
// `B` - type of response's body
impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddleware {
            service,
            app_config: self.app_config.clone(),
        }))
    }
}

pub struct AuthenticationMiddleware<S> {
    service: S,
    app_config: Arc<AppConfig>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let state = authenticate(&req, &self.app_config.jwt_secret);
        req.extensions_mut().insert(state);

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret";

    fn claims_for(sub: &str, exp_offset: i64) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: Some("asha@example.com".to_string()),
            full_name: Some("Asha".to_string()),
            phone: Some("+919999999999".to_string()),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        }
    }

    fn token_for(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap()
    }

    #[test]
    fn missing_or_malformed_headers_read_as_missing() {
        let req = TestRequest::default().to_srv_request();
        assert!(matches!(authenticate(&req, SECRET), AuthState::Missing));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Token abc"))
            .to_srv_request();
        assert!(matches!(authenticate(&req, SECRET), AuthState::Missing));
    }

    #[test]
    fn a_valid_token_carries_the_profile_through() {
        let token = token_for(&claims_for("user-1", 3600), SECRET);
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_srv_request();

        match authenticate(&req, SECRET) {
            AuthState::Verified(user) => {
                assert_eq!(user.user_id, "user-1");
                assert_eq!(user.email.as_deref(), Some("asha@example.com"));
                assert_eq!(user.full_name.as_deref(), Some("Asha"));
                assert_eq!(user.phone.as_deref(), Some("+919999999999"));
            }
            other => panic!("expected a verified user, got {:?}", other),
        }
    }

    #[test]
    fn wrong_secret_and_expired_tokens_read_as_invalid() {
        let forged = token_for(&claims_for("user-1", 3600), "some-other-secret");
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, format!("Bearer {}", forged)))
            .to_srv_request();
        assert!(matches!(authenticate(&req, SECRET), AuthState::Invalid));

        let expired = token_for(&claims_for("user-1", -3600), SECRET);
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, format!("Bearer {}", expired)))
            .to_srv_request();
        assert!(matches!(authenticate(&req, SECRET), AuthState::Invalid));
    }

    #[test]
    fn extraction_maps_each_state_onto_the_taxonomy() {
        assert!(matches!(user_from_state(None), Err(ApiError::NoToken)));
        assert!(matches!(
            user_from_state(Some(AuthState::Missing)),
            Err(ApiError::NoToken)
        ));
        assert!(matches!(
            user_from_state(Some(AuthState::Invalid)),
            Err(ApiError::InvalidToken)
        ));
        let user = AuthenticatedUser {
            user_id: "user-1".to_string(),
            email: None,
            full_name: None,
            phone: None,
        };
        assert_eq!(
            user_from_state(Some(AuthState::Verified(user))).unwrap().user_id,
            "user-1"
        );
    }
}
