//! The fixed `msgtype` enumeration shared with the chat server.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValueObjectError;

/// Message type discriminant carried in every envelope.
///
/// Serialized as the bare integer the server expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MsgType {
    LoginRequest = 1,
    LoginResponse = 2,
    Logout = 3,
    RegisterRequest = 4,
    RegisterResponse = 5,
    OneToOneChat = 6,
    GroupChat = 7,
    AddFriendRequest = 8,
    AddFriendResponse = 9,
    CreateGroupRequest = 10,
    /// Reserved by the server; no response is defined.
    JoinGroupRequest = 11,
    CreateGroupResponse = 12,
}

impl MsgType {
    /// All message types in discriminant order.
    pub const ALL: [MsgType; 12] = [
        MsgType::LoginRequest,
        MsgType::LoginResponse,
        MsgType::Logout,
        MsgType::RegisterRequest,
        MsgType::RegisterResponse,
        MsgType::OneToOneChat,
        MsgType::GroupChat,
        MsgType::AddFriendRequest,
        MsgType::AddFriendResponse,
        MsgType::CreateGroupRequest,
        MsgType::JoinGroupRequest,
        MsgType::CreateGroupResponse,
    ];

    /// The integer sent on the wire.
    pub const fn as_i64(self) -> i64 {
        self as i64
    }

    /// The message type the server answers this request with, if any.
    pub const fn response_type(self) -> Option<MsgType> {
        match self {
            MsgType::LoginRequest => Some(MsgType::LoginResponse),
            MsgType::RegisterRequest => Some(MsgType::RegisterResponse),
            MsgType::AddFriendRequest => Some(MsgType::AddFriendResponse),
            MsgType::CreateGroupRequest => Some(MsgType::CreateGroupResponse),
            _ => None,
        }
    }

    /// Whether this type is an acknowledgement sent by the server.
    pub const fn is_response(self) -> bool {
        matches!(
            self,
            MsgType::LoginResponse
                | MsgType::RegisterResponse
                | MsgType::AddFriendResponse
                | MsgType::CreateGroupResponse
        )
    }
}

impl TryFrom<i64> for MsgType {
    type Error = ValueObjectError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        MsgType::ALL
            .into_iter()
            .find(|t| t.as_i64() == value)
            .ok_or(ValueObjectError::UnknownMsgType(value))
    }
}

impl From<MsgType> for i64 {
    fn from(value: MsgType) -> Self {
        value.as_i64()
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MsgType::LoginRequest => "LOGIN_REQUEST",
            MsgType::LoginResponse => "LOGIN_RESPONSE",
            MsgType::Logout => "LOGOUT",
            MsgType::RegisterRequest => "REGISTER_REQUEST",
            MsgType::RegisterResponse => "REGISTER_RESPONSE",
            MsgType::OneToOneChat => "ONE_TO_ONE_CHAT",
            MsgType::GroupChat => "GROUP_CHAT",
            MsgType::AddFriendRequest => "ADD_FRIEND_REQUEST",
            MsgType::AddFriendResponse => "ADD_FRIEND_RESPONSE",
            MsgType::CreateGroupRequest => "CREATE_GROUP_REQUEST",
            MsgType::JoinGroupRequest => "JOIN_GROUP_REQUEST",
            MsgType::CreateGroupResponse => "CREATE_GROUP_RESPONSE",
        };
        write!(f, "{name}({})", self.as_i64())
    }
}
