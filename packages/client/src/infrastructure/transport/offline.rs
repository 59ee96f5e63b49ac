//! Offline responder used when the chat server cannot be reached.
//!
//! Answers login, register, add-friend and create-group requests with
//! fabricated successful acknowledgements after [`OFFLINE_REPLY_DELAY`], so
//! request/response flows still complete during offline development. Every
//! other frame, heartbeats included, is swallowed.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep_until};

use super::{Connector, Transport};
use crate::domain::{GroupId, MsgType, UserId};
use crate::infrastructure::dto::{
    AddFriendResponse, CreateGroupResponse, Envelope, FriendInfo, GroupInfo, LoginRequest,
    LoginResponse, RegisterResponse,
};
use crate::infrastructure::error::{ProtocolError, TransportError};

/// Delay before a fabricated acknowledgement is delivered.
pub const OFFLINE_REPLY_DELAY: Duration = Duration::from_millis(300);

/// Connector that always succeeds with an [`OfflineTransport`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineConnector;

#[async_trait]
impl Connector for OfflineConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        tracing::warn!(url, "using offline responder instead of the chat server");
        Ok(Box::new(OfflineTransport::new()))
    }
}

/// Local socket stand-in that fabricates acknowledgements.
#[derive(Debug, Default)]
pub struct OfflineTransport {
    replies: VecDeque<(Instant, String)>,
    closed: bool,
}

impl OfflineTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn fabricate_reply(request: &Envelope) -> Result<Option<Envelope>, ProtocolError> {
        let reply = match request.msg_type {
            MsgType::LoginRequest => {
                let login = request.decode::<LoginRequest>()?;
                let response = LoginResponse {
                    error: 0,
                    userid: Some(login.id),
                    name: Some(format!("user{}", login.id)),
                    friends: vec![
                        FriendInfo {
                            userid: UserId::new(1),
                            name: "user1".to_string(),
                            online_status: true,
                        },
                        FriendInfo {
                            userid: UserId::new(2),
                            name: "user2".to_string(),
                            online_status: false,
                        },
                    ],
                    groups: vec![GroupInfo {
                        groupid: GroupId::new(101),
                        name: "test group".to_string(),
                        desc: "sample group served by the offline responder".to_string(),
                    }],
                    offlinemessages: vec![],
                };
                Envelope::from_payload(None, MsgType::LoginResponse, &response)?
            }
            MsgType::RegisterRequest => Envelope::from_payload(
                None,
                MsgType::RegisterResponse,
                &RegisterResponse { error: 0, id: None },
            )?,
            MsgType::AddFriendRequest => Envelope::from_payload(
                None,
                MsgType::AddFriendResponse,
                &AddFriendResponse {
                    error: 0,
                    friend: None,
                },
            )?,
            MsgType::CreateGroupRequest => Envelope::from_payload(
                None,
                MsgType::CreateGroupResponse,
                &CreateGroupResponse {
                    error: 0,
                    group: None,
                },
            )?,
            _ => return Ok(None),
        };
        Ok(Some(reply))
    }
}

#[async_trait]
impl Transport for OfflineTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        let Ok(request) = Envelope::parse(&text) else {
            return Ok(());
        };
        match Self::fabricate_reply(&request) {
            Ok(Some(reply)) => {
                let frame = reply
                    .to_frame()
                    .map_err(|e| TransportError::Send(e.to_string()))?;
                tracing::debug!(request = %request.msg_type, reply = %reply.msg_type, "offline reply scheduled");
                self.replies
                    .push_back((Instant::now() + OFFLINE_REPLY_DELAY, frame));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "offline responder could not answer request"),
        }
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        if self.closed {
            return None;
        }
        let Some(ready_at) = self.replies.front().map(|(at, _)| *at) else {
            return std::future::pending().await;
        };
        sleep_until(ready_at).await;
        self.replies.pop_front().map(|(_, frame)| Ok(frame))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        self.replies.clear();
        Ok(())
    }
}
