//! UseCase 層
//!
//! サーバーとの要求・応答のやり取りを実装するレイヤー。
//! 呼び出し側（UI や CLI）から使われ、Client 層の Connection を操作します。

pub mod add_friend;
pub mod create_group;
pub mod login;
pub mod logout;
pub mod register;
pub mod send_chat;

pub use add_friend::{AddFriendOutcome, AddFriendUseCase};
pub use create_group::{CreateGroupOutcome, CreateGroupUseCase};
pub use login::{LoginOutcome, LoginUseCase};
pub use logout::LogoutUseCase;
pub use register::RegisterUseCase;
pub use send_chat::SendChatUseCase;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::client::{ClientConfig, Connection};
    use crate::infrastructure::dto::Envelope;
    use crate::infrastructure::transport::MockConnector;
    use crate::infrastructure::transport::scripted::{ScriptedPeer, scripted_pair};

    /// 接続済みの Connection と、サーバー役のピアを作成
    pub async fn connected() -> (Connection, ScriptedPeer) {
        let (transport, peer) = scripted_pair();
        let mut connector = MockConnector::new();
        connector
            .expect_connect()
            .times(1)
            .return_once(move |_| Ok(Box::new(transport)));
        let connection = Connection::with_connector(
            ClientConfig::new("ws://chat.test"),
            Arc::new(connector),
        );
        connection.connect().await.unwrap();
        (connection, peer)
    }

    /// 要求を 1 つ受け取り、`reply` を返すサーバー役のタスクを起動
    pub fn reply_once(
        mut peer: ScriptedPeer,
        reply: &'static str,
    ) -> tokio::task::JoinHandle<(Envelope, ScriptedPeer)> {
        tokio::spawn(async move {
            let frame = peer.recv().await.unwrap();
            let request = Envelope::parse(&frame).unwrap();
            peer.send(reply);
            (request, peer)
        })
    }
}
