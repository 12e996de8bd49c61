//! Frame handlers
//!
//! Routes parsed client frames to their handler.

mod error;
mod room;

pub use error::{HandlerError, HandlerResult};

use crate::connection::Connection;
use crate::protocol::{ClientFrame, ServerFrame};
use crate::server::GatewayState;
use std::sync::Arc;

/// Dispatches client frames to handlers.
pub struct FrameDispatcher;

impl FrameDispatcher {
    /// Handle one frame from a connection.
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        frame: ClientFrame,
    ) -> HandlerResult<()> {
        match frame {
            ClientFrame::Join {
                project_id,
                display_name,
            } => room::handle_join(state, connection, project_id, display_name).await,
            ClientFrame::Leave => room::handle_leave(state, connection).await,
            ClientFrame::Ping => {
                connection
                    .send(ServerFrame::Pong)
                    .await
                    .map_err(|_| HandlerError::ConnectionClosed)?;
                Ok(())
            }
        }
    }
}
