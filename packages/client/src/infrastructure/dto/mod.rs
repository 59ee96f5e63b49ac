//! Data transfer objects exchanged with the chat server.

pub mod websocket;

pub use websocket::{
    AddFriendRequest, AddFriendResponse, Acknowledgement, CreateGroupRequest,
    CreateGroupResponse, Envelope, FriendInfo, GroupChat, GroupInfo, HEARTBEAT_FRAME,
    JoinGroupRequest, LoginRequest, LoginResponse, LogoutRequest, OneToOneChat, RegisterRequest,
    RegisterResponse,
};
