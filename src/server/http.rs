//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One tokio task per
//! connection; all shared state lives behind `Arc<AppState>`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::JwtIdentityVerifier;
use crate::config::Args;
use crate::db::repo::{ApplicationRepo, OrderRepo, TuitionRepo, UserRepo};
use crate::db::schemas::{
    APPLICATION_COLLECTION, ORDER_COLLECTION, TUITION_COLLECTION, USER_COLLECTION,
};
use crate::db::MongoClient;
use crate::payments::StripeClient;
use crate::routes::{self, error_response, FullBody};
use crate::services::{AccountService, CheckoutService};
use crate::types::{HubError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub tuitions: TuitionRepo,
    pub applications: ApplicationRepo,
    pub orders: OrderRepo,
    pub users: UserRepo,
    pub verifier: JwtIdentityVerifier,
    pub checkout: CheckoutService,
    pub accounts: AccountService,
    pub started_at: Instant,
}

impl AppState {
    /// Wire up repositories and workflows over an open MongoDB connection.
    /// Collection construction applies each schema's indexes, so the
    /// unique transactionId and email constraints exist before traffic.
    pub async fn new(args: Args, mongo: MongoClient) -> Result<Self> {
        let tuitions = TuitionRepo::new(mongo.collection(TUITION_COLLECTION).await?);
        let applications = ApplicationRepo::new(mongo.collection(APPLICATION_COLLECTION).await?);
        let orders = OrderRepo::new(mongo.collection(ORDER_COLLECTION).await?);
        let users = UserRepo::new(mongo.collection(USER_COLLECTION).await?);

        let jwt_secret = args
            .jwt_secret
            .clone()
            .ok_or_else(|| HubError::Config("JWT_SECRET is required".into()))?;
        let verifier = JwtIdentityVerifier::new(jwt_secret);

        let stripe_key = args
            .stripe_secret_key
            .clone()
            .ok_or_else(|| HubError::Config("STRIPE_SECRET_KEY is required".into()))?;
        let processor = StripeClient::new(args.stripe_api_base.clone(), stripe_key);

        let checkout = CheckoutService::new(
            Arc::new(processor),
            Arc::new(orders.clone()),
            Arc::new(applications.clone()),
            args.client_domain.clone(),
        );
        let accounts = AccountService::new(Arc::new(users.clone()));

        Ok(Self {
            args,
            tuitions,
            applications,
            orders,
            users,
            verifier,
            checkout,
            accounts,
            started_at: Instant::now(),
        })
    }
}

/// Run the HTTP server until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen)
        .await
        .map_err(|e| HubError::Config(format!("Failed to bind {}: {}", state.args.listen, e)))?;

    info!("Listening on http://{}", state.args.listen);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<FullBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let result = match (method, path.as_str()) {
        (Method::GET, "/") => Ok(routes::health::greeting()),
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            Ok(routes::health::health_check(&state))
        }
        (Method::GET, "/version") => Ok(routes::health::version_info()),

        // CORS preflight
        (Method::OPTIONS, _) => Ok(preflight_response()),

        // Tuition postings
        (Method::POST, "/tuitions") => routes::tuitions::create(&state, req).await,
        (Method::GET, "/tuitions") => routes::tuitions::board(&state).await,
        (Method::GET, "/all-tuitions") => routes::tuitions::search(&state, req).await,
        (Method::GET, "/latest-tuitions") => routes::tuitions::latest(&state).await,
        (Method::GET, "/tuitions-listing") => routes::tuitions::listing(&state, req).await,
        (Method::PATCH, p) if p.starts_with("/tuition/status/") => {
            let id = p["/tuition/status/".len()..].to_string();
            routes::tuitions::set_status(&state, req, &id).await
        }
        (Method::PUT, p) if p.starts_with("/tuitions/") => {
            let id = p["/tuitions/".len()..].to_string();
            routes::tuitions::update(&state, req, &id).await
        }
        (Method::DELETE, p) if p.starts_with("/tuitions/") => {
            let id = p["/tuitions/".len()..].to_string();
            routes::tuitions::delete(&state, req, &id).await
        }

        // Tutor applications
        (Method::GET, "/applications") => routes::applications::list_all(&state, req).await,
        (Method::POST, "/applications") => routes::applications::create(&state, req).await,
        (Method::PATCH, p) if p.starts_with("/applications/status/") => {
            let id = p["/applications/status/".len()..].to_string();
            routes::applications::set_status(&state, req, &id).await
        }
        (Method::GET, p) if p.starts_with("/applications/") => {
            let email = p["/applications/".len()..].to_string();
            routes::applications::list_by_email(&state, req, &email).await
        }
        (Method::PUT, p) if p.starts_with("/applications/") => {
            let id = p["/applications/".len()..].to_string();
            routes::applications::update(&state, req, &id).await
        }
        (Method::DELETE, p) if p.starts_with("/applications/") => {
            let id = p["/applications/".len()..].to_string();
            routes::applications::delete(&state, req, &id).await
        }
        (Method::GET, "/my-ongoing-tuitions") => {
            routes::applications::my_ongoing(&state, req).await
        }

        // Checkout and orders
        (Method::POST, "/create-checkout-session") => {
            routes::payments::create_checkout_session(&state, req).await
        }
        (Method::POST, "/payment-success") => routes::payments::payment_success(&state, req).await,
        (Method::GET, "/my-orders") => routes::payments::my_orders(&state, req).await,
        (Method::GET, "/transaction-history") => {
            routes::payments::transaction_history(&state, req).await
        }

        // Users
        (Method::GET, "/users") => routes::users::list(&state, req).await,
        (Method::PUT, "/users") => routes::users::upsert(&state, req).await,
        (Method::PATCH, p) if p.starts_with("/users/") => {
            let id = p["/users/".len()..].to_string();
            routes::users::patch(&state, req, &id).await
        }
        (Method::DELETE, p) if p.starts_with("/users/") => {
            let id = p["/users/".len()..].to_string();
            routes::users::delete(&state, req, &id).await
        }
        (Method::GET, "/user/role") => routes::users::role(&state, req).await,

        _ => Err(HubError::NotFound(format!("No route for {}", path))),
    };

    let mut response = result.unwrap_or_else(error_response);
    apply_cors(&mut response, &state.args.client_domain);
    Ok(response)
}

/// CORS preflight response; concrete headers are filled by `apply_cors`
fn preflight_response() -> Response<FullBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        )
        .header(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            "Content-Type, Authorization",
        )
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Add CORS headers, scoping the allowed origin to the configured client
fn apply_cors(response: &mut Response<FullBody>, client_domain: &str) {
    if let Ok(origin) = header::HeaderValue::from_str(client_domain) {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        header::HeaderValue::from_static("true"),
    );
    response
        .headers_mut()
        .insert(header::VARY, header::HeaderValue::from_static("Origin"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_cors_sets_configured_origin() {
        let mut response = Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::new()))
            .unwrap();

        apply_cors(&mut response, "https://tuitions.example");

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://tuitions.example"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[test]
    fn test_preflight_allows_used_methods() {
        let response = preflight_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let methods = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        for method in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
            assert!(methods.contains(method));
        }
    }
}
