//! Room membership handlers
//!
//! Join and leave requests. Joins are gated through the admission gate before
//! touching the registry; a denied join has already had its error frame
//! delivered, so the handler simply stops.

use crate::connection::Connection;
use crate::handlers::{HandlerError, HandlerResult};
use crate::server::GatewayState;
use hackboard_core::ProjectId;
use std::sync::Arc;

/// Handle a join request: admit, commit the membership move, announce it.
pub async fn handle_join(
    state: &GatewayState,
    connection: &Arc<Connection>,
    project_id: ProjectId,
    display_name: Option<String>,
) -> HandlerResult<()> {
    if state.gate().intercept(connection).await.is_err() {
        // Denial already delivered on the connection's error channel.
        return Ok(());
    }

    let Some(transition) = state
        .registry()
        .set_room(connection.id(), project_id.clone(), display_name)
    else {
        return Err(HandlerError::NotRegistered);
    };

    tracing::info!(
        connection_id = %connection.id(),
        room = %project_id,
        "Connection joined room"
    );

    state.broadcaster().announce(&transition).await;
    Ok(())
}

/// Handle an explicit leave: the connection stays registered without a room.
pub async fn handle_leave(
    state: &GatewayState,
    connection: &Arc<Connection>,
) -> HandlerResult<()> {
    if let Some(transition) = state.registry().clear_room(connection.id()) {
        tracing::info!(
            connection_id = %connection.id(),
            room = transition.left.as_ref().map(ProjectId::as_str).unwrap_or("-"),
            "Connection left room"
        );
        state.broadcaster().announce(&transition).await;
    }
    Ok(())
}
