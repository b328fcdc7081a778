use utoipa::OpenApi;

use crate::dispatch::DispatchOutcome;
use crate::handlers::{HealthResponse, UserDeletedEvent};
use crate::registry::{RegisterTokenRequest, RegisterTokenResult};
use crate::sweeper::SweepReport;
use crate::writer::{DirectNotificationRequest, DirectNotificationResult};
use solarvita_common::{NotificationDocument, Platform, PurgeCounts};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::update_user_token,
        crate::handlers::send_direct_notification,
        crate::handlers::notification_created,
        crate::handlers::user_deleted,
        crate::handlers::retention_sweep,
        crate::handlers::health,
    ),
    components(schemas(
        RegisterTokenRequest,
        RegisterTokenResult,
        DirectNotificationRequest,
        DirectNotificationResult,
        NotificationDocument,
        Platform,
        DispatchOutcome,
        UserDeletedEvent,
        PurgeCounts,
        SweepReport,
        HealthResponse
    )),
    tags(
        (name = "Callables", description = "Firebase callable endpoints invoked by the mobile app"),
        (name = "Triggers", description = "Endpoints invoked by the hosting platform"),
        (name = "Health", description = "Liveness and store health")
    )
)]
pub struct NotificationsApiDoc;
