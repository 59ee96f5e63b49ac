//! UseCase: 友達追加処理

use std::sync::Arc;

use crate::client::Connection;
use crate::domain::{MsgIdGenerator, MsgType, UserId};
use crate::error::RequestError;
use crate::infrastructure::dto::{
    Acknowledgement, AddFriendRequest, AddFriendResponse, Envelope, FriendInfo,
};

/// 友達追加の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddFriendOutcome {
    pub success: bool,
    /// サーバーが返した友達情報（返された場合のみ）
    pub friend: Option<FriendInfo>,
}

/// 友達追加のユースケース
pub struct AddFriendUseCase {
    connection: Connection,
    ids: Arc<MsgIdGenerator>,
}

impl AddFriendUseCase {
    pub fn new(connection: Connection, ids: Arc<MsgIdGenerator>) -> Self {
        Self { connection, ids }
    }

    /// 友達追加を実行
    pub async fn execute(
        &self,
        userid: UserId,
        friendid: UserId,
    ) -> Result<AddFriendOutcome, RequestError> {
        let request = Envelope::from_payload(
            Some(self.ids.next_id()),
            MsgType::AddFriendRequest,
            &AddFriendRequest { userid, friendid },
        )?;

        let response = self
            .connection
            .request(&request)
            .await?
            .decode::<AddFriendResponse>()?;
        Ok(AddFriendOutcome {
            success: response.is_success(),
            friend: response.friend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::testing::{connected, reply_once};

    #[tokio::test]
    async fn test_add_friend_returns_friend_info() {
        // テスト項目: 友達追加の応答から成否と友達情報が取り出される
        // given (前提条件):
        let (connection, peer) = connected().await;
        let server = reply_once(
            peer,
            r#"{"msgtype":9,"error":0,"friend":{"userid":2,"name":"bob","onlineStatus":true}}"#,
        );
        let usecase = AddFriendUseCase::new(connection, Arc::new(MsgIdGenerator::new()));

        // when (操作):
        let outcome = usecase
            .execute(UserId::new(1), UserId::new(2))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(outcome.success);
        assert_eq!(
            outcome.friend,
            Some(FriendInfo {
                userid: UserId::new(2),
                name: "bob".to_string(),
                online_status: true
            })
        );
        let (request, _peer) = server.await.unwrap();
        assert_eq!(
            request.decode::<AddFriendRequest>().unwrap(),
            AddFriendRequest {
                userid: UserId::new(1),
                friendid: UserId::new(2)
            }
        );
    }

    #[tokio::test]
    async fn test_add_friend_failure_without_friend() {
        // テスト項目: 失敗応答では success が false で友達情報は無い
        let (connection, peer) = connected().await;
        let _server = reply_once(peer, r#"{"msgtype":9,"error":1}"#);
        let usecase = AddFriendUseCase::new(connection, Arc::new(MsgIdGenerator::new()));

        let outcome = usecase
            .execute(UserId::new(1), UserId::new(99))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AddFriendOutcome {
                success: false,
                friend: None
            }
        );
    }
}
