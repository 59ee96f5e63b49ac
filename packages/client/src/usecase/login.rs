//! UseCase: ログイン処理
//!
//! LOGIN_REQUEST を送信し、LOGIN_RESPONSE を待ち受けます。
//! ログインに成功した場合、サーバーに溜まっていたオフラインメッセージを
//! 通常の受信メッセージと同じようにハンドラへ配送します。

use std::sync::Arc;

use crate::client::Connection;
use crate::domain::{MsgIdGenerator, MsgType, UserId};
use crate::error::RequestError;
use crate::infrastructure::dto::{Acknowledgement, Envelope, LoginRequest, LoginResponse};

/// ログイン結果
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    /// `error == 0` の場合のみ true
    pub success: bool,
    pub response: LoginResponse,
}

/// ログインのユースケース
pub struct LoginUseCase {
    connection: Connection,
    ids: Arc<MsgIdGenerator>,
}

impl LoginUseCase {
    /// 新しい LoginUseCase を作成
    pub fn new(connection: Connection, ids: Arc<MsgIdGenerator>) -> Self {
        Self { connection, ids }
    }

    /// ログインを実行
    ///
    /// # Arguments
    ///
    /// * `id` - ユーザー ID
    /// * `password` - パスワード
    ///
    /// # Returns
    ///
    /// * `Ok(LoginOutcome)` - サーバーからの応答（成否を含む）
    /// * `Err(RequestError)` - 送信失敗・タイムアウト・切断
    pub async fn execute(
        &self,
        id: UserId,
        password: impl Into<String>,
    ) -> Result<LoginOutcome, RequestError> {
        let request = Envelope::from_payload(
            Some(self.ids.next_id()),
            MsgType::LoginRequest,
            &LoginRequest {
                id,
                password: password.into(),
            },
        )?;

        let response = self
            .connection
            .request(&request)
            .await?
            .decode::<LoginResponse>()?;
        let success = response.is_success();
        tracing::info!(%id, success, error = response.error, "login answered");

        if success {
            for envelope in response.offline_envelopes() {
                self.connection.router().deliver(&envelope);
            }
        }

        Ok(LoginOutcome { success, response })
    }
}
