//! UseCase: ログアウト処理
//!
//! 接続中であれば LOGOUT を送信し、その後に切断します。

use std::sync::Arc;

use crate::client::Connection;
use crate::domain::{MsgIdGenerator, MsgType, UserId};
use crate::infrastructure::dto::{Envelope, LogoutRequest};

/// ログアウトのユースケース
pub struct LogoutUseCase {
    connection: Connection,
    ids: Arc<MsgIdGenerator>,
}

impl LogoutUseCase {
    pub fn new(connection: Connection, ids: Arc<MsgIdGenerator>) -> Self {
        Self { connection, ids }
    }

    /// ログアウトを実行
    ///
    /// LOGOUT の送信に失敗しても切断は必ず行います。
    pub fn execute(&self, id: UserId) {
        if self.connection.is_connected() {
            let sent = Envelope::from_payload(
                Some(self.ids.next_id()),
                MsgType::Logout,
                &LogoutRequest { id },
            )
            .map_err(|e| e.to_string())
            .and_then(|envelope| self.connection.send(&envelope).map_err(|e| e.to_string()));
            if let Err(e) = sent {
                tracing::warn!(%id, error = %e, "failed to send logout");
            }
        }
        self.connection.disconnect();
        tracing::info!(%id, "logged out");
    }
}
