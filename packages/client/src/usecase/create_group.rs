//! UseCase: グループ作成処理

use std::sync::Arc;

use crate::client::Connection;
use crate::domain::{MsgIdGenerator, MsgType, UserId};
use crate::error::RequestError;
use crate::infrastructure::dto::{
    Acknowledgement, CreateGroupRequest, CreateGroupResponse, Envelope, GroupInfo,
};

/// グループ作成の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupOutcome {
    pub success: bool,
    pub group: Option<GroupInfo>,
}

/// グループ作成のユースケース
pub struct CreateGroupUseCase {
    connection: Connection,
    ids: Arc<MsgIdGenerator>,
}

impl CreateGroupUseCase {
    pub fn new(connection: Connection, ids: Arc<MsgIdGenerator>) -> Self {
        Self { connection, ids }
    }

    /// グループ作成を実行
    ///
    /// # Arguments
    ///
    /// * `userid` - 作成者
    /// * `name` - グループ名
    /// * `desc` - グループの説明
    /// * `members` - 初期メンバー
    pub async fn execute(
        &self,
        userid: UserId,
        name: impl Into<String>,
        desc: impl Into<String>,
        members: Vec<UserId>,
    ) -> Result<CreateGroupOutcome, RequestError> {
        let request = Envelope::from_payload(
            Some(self.ids.next_id()),
            MsgType::CreateGroupRequest,
            &CreateGroupRequest {
                userid,
                name: name.into(),
                desc: desc.into(),
                useridlist: members,
            },
        )?;

        let response = self
            .connection
            .request(&request)
            .await?
            .decode::<CreateGroupResponse>()?;
        Ok(CreateGroupOutcome {
            success: response.is_success(),
            group: response.group,
        })
    }
}
