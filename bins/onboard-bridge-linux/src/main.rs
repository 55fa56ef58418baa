use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use onboard_connector::{ConnectionOutcome, ConnectorConfig, ErrorKind, Platform, ProvisioningFacade};
use onboard_core::sim::SimulatedPlatform;
use onboard_protocol::{
    decode_connect_request, decode_connect_saved_request, encode_response, BridgeResponse,
    CurrentSsidResponse, GatewayResponse, OutcomeResponse, SavedListResponse, SavedResponse,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type AppState = Arc<ProvisioningFacade>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,onboard_connector=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Onboarding bridge starting...");

    // Configuration
    let config = match std::env::var("ONBOARD_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading configuration from {}", path);
            ConnectorConfig::load(&path)?
        }
        Err(_) => ConnectorConfig::default(),
    };
    config.validate()?;

    let addr: SocketAddr = std::env::var("ONBOARD_BIND")
        .unwrap_or_else(|_| "0.0.0.0:3080".into())
        .parse()?;
    let sdk_level: u32 = match std::env::var("ONBOARD_SIM_SDK") {
        Ok(level) => level.parse()?,
        Err(_) => 33,
    };

    // Demo platform: one open device hotspot and one saved home network
    let sim = Arc::new(SimulatedPlatform::new(sdk_level));
    sim.add_access_point("DeviceAP", None, Ipv4Addr::new(192, 168, 4, 1));
    sim.add_access_point("HomeNet", Some("homepassword"), Ipv4Addr::new(192, 168, 1, 1));
    sim.seed_raw_profile("\"HomeNet\"");

    let facade = Arc::new(ProvisioningFacade::new(Platform::from_shared(sim), config));

    let app = Router::new()
        .route("/wifi/connect", post(connect_handler))
        .route("/wifi/connect-saved", post(connect_saved_handler))
        .route("/wifi/gateway", get(gateway_handler))
        .route("/wifi/saved", get(saved_list_handler))
        .route("/wifi/saved/:ssid", get(saved_handler))
        .route("/wifi/current", get(current_handler))
        .route("/wifi/binding/release", post(release_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(facade);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Bridge listening on {} (simulated platform, sdk {})", addr, sdk_level);
    tracing::info!("Try these commands:");
    tracing::info!("   curl http://localhost:{}/wifi/saved", addr.port());
    tracing::info!(
        "   curl -X POST -d '{{\"ssid\":\"DeviceAP\"}}' http://localhost:{}/wifi/connect",
        addr.port()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down...");
            }
        })
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Encode a response body with the given status.
fn reply(status: StatusCode, msg: BridgeResponse) -> Response {
    match encode_response(&msg) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!("Failed to encode response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn status_for(outcome: &ConnectionOutcome) -> StatusCode {
    match outcome.failure_reason() {
        None => StatusCode::OK,
        Some(ErrorKind::InvalidArgument) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::Busy) => StatusCode::CONFLICT,
        Some(ErrorKind::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        Some(ErrorKind::NetworkUnavailable) => StatusCode::BAD_GATEWAY,
        Some(ErrorKind::ConfigurationRejected) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(ErrorKind::PlatformUnsupported) => StatusCode::NOT_IMPLEMENTED,
    }
}

fn outcome_reply(outcome: &ConnectionOutcome) -> Response {
    reply(
        status_for(outcome),
        BridgeResponse::Outcome(OutcomeResponse::from(outcome)),
    )
}

/// Join a network with fresh credentials.
///
/// A client that disconnects mid-request drops this future, which cancels
/// the attempt and releases the platform callback.
async fn connect_handler(State(facade): State<AppState>, body: String) -> Response {
    let request = match decode_connect_request(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("Bad connect request: {}", e);
            return outcome_reply(&ConnectionOutcome::failure(ErrorKind::InvalidArgument));
        }
    };
    let outcome = facade.connect_request(request.into_request()).await;
    outcome_reply(&outcome)
}

/// Re-activate a saved network.
async fn connect_saved_handler(State(facade): State<AppState>, body: String) -> Response {
    let request = match decode_connect_saved_request(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("Bad connect-saved request: {}", e);
            return outcome_reply(&ConnectionOutcome::failure(ErrorKind::InvalidArgument));
        }
    };
    let outcome = facade.connect_saved(&request.ssid).await;
    outcome_reply(&outcome)
}

async fn gateway_handler(State(facade): State<AppState>) -> Response {
    let gateway = facade.get_gateway();
    reply(
        StatusCode::OK,
        BridgeResponse::Gateway(GatewayResponse::from(&gateway)),
    )
}

async fn saved_list_handler(State(facade): State<AppState>) -> Response {
    let ssids = facade.get_saved_wifi_list();
    reply(
        StatusCode::OK,
        BridgeResponse::SavedList(SavedListResponse { ssids }),
    )
}

async fn saved_handler(Path(ssid): Path<String>, State(facade): State<AppState>) -> Response {
    let saved = facade.is_wifi_saved(&ssid);
    reply(StatusCode::OK, BridgeResponse::Saved(SavedResponse { ssid, saved }))
}

async fn current_handler(State(facade): State<AppState>) -> Response {
    let ssid = facade.get_current_wifi_ssid();
    reply(
        StatusCode::OK,
        BridgeResponse::CurrentSsid(CurrentSsidResponse { ssid }),
    )
}

/// Restore the default route.
async fn release_handler(State(facade): State<AppState>) -> StatusCode {
    match facade.release_binding() {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::error!("Failed to release binding: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
