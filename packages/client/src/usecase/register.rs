//! UseCase: ユーザー登録処理

use std::sync::Arc;

use crate::client::Connection;
use crate::domain::{MsgIdGenerator, MsgType, UserId};
use crate::error::RequestError;
use crate::infrastructure::dto::{Acknowledgement, Envelope, RegisterRequest, RegisterResponse};

/// ユーザー登録のユースケース
pub struct RegisterUseCase {
    connection: Connection,
    ids: Arc<MsgIdGenerator>,
}

impl RegisterUseCase {
    pub fn new(connection: Connection, ids: Arc<MsgIdGenerator>) -> Self {
        Self { connection, ids }
    }

    /// ユーザー登録を実行
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 登録成功（error 0）
    /// * `Ok(false)` - サーバーが登録を拒否
    /// * `Err(RequestError)` - 送信失敗・タイムアウト・切断
    pub async fn execute(
        &self,
        id: UserId,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<bool, RequestError> {
        let request = Envelope::from_payload(
            Some(self.ids.next_id()),
            MsgType::RegisterRequest,
            &RegisterRequest {
                id,
                name: name.into(),
                password: password.into(),
            },
        )?;

        let response = self
            .connection
            .request(&request)
            .await?
            .decode::<RegisterResponse>()?;
        tracing::info!(%id, error = response.error, "registration answered");
        Ok(response.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::testing::{connected, reply_once};

    #[tokio::test]
    async fn test_register_success() {
        // テスト項目: error 0 の応答で登録成功となり、要求に id・名前・パスワードが含まれる
        // given (前提条件):
        let (connection, peer) = connected().await;
        let server = reply_once(peer, r#"{"msgtype":5,"error":0}"#);
        let usecase = RegisterUseCase::new(connection, Arc::new(MsgIdGenerator::new()));

        // when (操作):
        let registered = usecase
            .execute(UserId::new(7), "carol", "pw")
            .await
            .unwrap();

        // then (期待する結果):
        assert!(registered);
        let (request, _peer) = server.await.unwrap();
        assert_eq!(
            request.decode::<RegisterRequest>().unwrap(),
            RegisterRequest {
                id: UserId::new(7),
                name: "carol".to_string(),
                password: "pw".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_register_rejected() {
        // テスト項目: error が 0 以外なら登録失敗 (false) となる
        let (connection, peer) = connected().await;
        let _server = reply_once(peer, r#"{"msgtype":5,"error":1}"#);
        let usecase = RegisterUseCase::new(connection, Arc::new(MsgIdGenerator::new()));

        let registered = usecase
            .execute(UserId::new(7), "carol", "pw")
            .await
            .unwrap();

        assert!(!registered);
    }
}
