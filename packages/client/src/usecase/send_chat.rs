//! UseCase: チャット送信処理
//!
//! 1 対 1 チャットとグループチャットを送信します。サーバーからの応答は
//! 無いため、送信キューに積めた時点で完了です。

use std::sync::Arc;

use crate::client::Connection;
use crate::domain::{GroupId, MsgId, MsgIdGenerator, MsgType, UserId};
use crate::error::SendError;
use crate::infrastructure::dto::{Envelope, GroupChat, OneToOneChat};

/// チャット送信のユースケース
pub struct SendChatUseCase {
    connection: Connection,
    ids: Arc<MsgIdGenerator>,
}

impl SendChatUseCase {
    pub fn new(connection: Connection, ids: Arc<MsgIdGenerator>) -> Self {
        Self { connection, ids }
    }

    /// 1 対 1 チャットを送信し、付与した msgid を返す
    pub fn one_to_one(
        &self,
        from: UserId,
        to: UserId,
        content: impl Into<String>,
    ) -> Result<MsgId, SendError> {
        let chat = OneToOneChat {
            fromid: from,
            toid: to,
            content: content.into(),
        };
        self.send(MsgType::OneToOneChat, &chat)
    }

    /// グループチャットを送信し、付与した msgid を返す
    pub fn group(
        &self,
        from: UserId,
        group: GroupId,
        content: impl Into<String>,
    ) -> Result<MsgId, SendError> {
        let chat = GroupChat {
            fromid: from,
            groupid: group,
            content: content.into(),
        };
        self.send(MsgType::GroupChat, &chat)
    }

    fn send<T: serde::Serialize>(&self, msg_type: MsgType, payload: &T) -> Result<MsgId, SendError> {
        let msg_id = self.ids.next_id();
        let envelope = Envelope::from_payload(Some(msg_id), msg_type, payload)
            .map_err(|e| SendError::Serialize(e.to_string()))?;
        self.connection.send(&envelope)?;
        Ok(msg_id)
    }
}
