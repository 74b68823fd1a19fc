//! 私信发送与查询
//!
//! 发送流程：持久化 -> 推送 `message_new` -> 查询收件人页面 -> 不在私信页时创建通知并推送。
//! 持久化之后的任何一步失败都不会让发送失败，只记录在 [`SendMessageOutcome::fan_out_failures`] 里。

use std::fmt;
use std::sync::Arc;

use domain::{
    notification_kinds, DirectMessage, DomainError, MessageId, MessageText, NewNotification,
    Notification, UserId,
};
use uuid::Uuid;

use crate::{
    clock::Clock,
    dispatcher::RealtimeDispatcher,
    dto::{ContactDto, MessageDto},
    error::ApplicationError,
    presence::PresenceTracker,
    repository::{MessageRepository, NotificationRepository, UserRepository},
};

/// 通知内容截取的字符数
pub const NOTIFICATION_PREVIEW_CHARS: usize = 120;
const THREAD_LIMIT: u32 = 500;
const UNKNOWN_SENDER: &str = "Someone";

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub sender_id: UserId,
    pub recipient_id: Option<Uuid>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOutStage {
    MessageEvent,
    SenderLookup,
    NotificationStore,
    NotificationEvent,
}

impl fmt::Display for FanOutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FanOutStage::MessageEvent => "message_event",
            FanOutStage::SenderLookup => "sender_lookup",
            FanOutStage::NotificationStore => "notification_store",
            FanOutStage::NotificationEvent => "notification_event",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutFailure {
    pub stage: FanOutStage,
    pub message: String,
}

impl FanOutFailure {
    fn new(stage: FanOutStage, error: impl fmt::Display) -> Self {
        Self {
            stage,
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SendMessageOutcome {
    pub message: DirectMessage,
    /// 收件人当时在私信页面，没有生成通知
    pub suppressed: bool,
    pub notification: Option<Notification>,
    pub fan_out_failures: Vec<FanOutFailure>,
}

impl SendMessageOutcome {
    pub fn fan_out_succeeded(&self) -> bool {
        self.fan_out_failures.is_empty()
    }

    pub fn notification_created(&self) -> bool {
        self.notification.is_some()
    }
}

pub struct MessagingServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub presence: Arc<PresenceTracker>,
    pub dispatcher: Arc<RealtimeDispatcher>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessagingService {
    deps: MessagingServiceDependencies,
}

impl MessagingService {
    pub fn new(deps: MessagingServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageOutcome, ApplicationError> {
        let recipient_id = match request.recipient_id {
            Some(id) if !request.text.trim().is_empty() => UserId::from(id),
            _ => return Err(DomainError::invalid_argument("fields", "missing_fields").into()),
        };
        let sender_id = request.sender_id;
        let text = MessageText::new(request.text)?;

        if self
            .deps
            .user_repository
            .find_by_id(recipient_id)
            .await?
            .is_none()
        {
            return Err(DomainError::UserNotFound.into());
        }

        let message = DirectMessage::new(
            MessageId::generate(),
            sender_id,
            recipient_id,
            text,
            self.deps.clock.now(),
        );
        let message = self.deps.message_repository.create(message).await?;
        tracing::debug!(
            message_id = %message.id,
            sender_id = %sender_id,
            recipient_id = %recipient_id,
            "私信已保存"
        );

        let mut outcome = SendMessageOutcome {
            message,
            suppressed: false,
            notification: None,
            fan_out_failures: Vec::new(),
        };

        if let Err(err) = self
            .deps
            .dispatcher
            .on_message(&outcome.message, recipient_id, sender_id)
        {
            outcome
                .fan_out_failures
                .push(FanOutFailure::new(FanOutStage::MessageEvent, err));
        }

        if self.deps.presence.is_on_messages_page(recipient_id) {
            outcome.suppressed = true;
            return Ok(outcome);
        }

        let sender_name = match self.deps.user_repository.find_by_id(sender_id).await {
            Ok(Some(sender)) => sender.full_name.as_str().to_owned(),
            Ok(None) => UNKNOWN_SENDER.to_owned(),
            Err(err) => {
                outcome
                    .fan_out_failures
                    .push(FanOutFailure::new(FanOutStage::SenderLookup, err));
                UNKNOWN_SENDER.to_owned()
            }
        };

        let new_notification = NewNotification {
            user_id: recipient_id,
            kind: notification_kinds::MESSAGE.to_owned(),
            icon: "💬".to_owned(),
            title: format!("New message from {sender_name}"),
            content: outcome.message.text.preview(NOTIFICATION_PREVIEW_CHARS),
            link: format!("/messages.html?contact={sender_id}"),
        };

        match self
            .deps
            .notification_repository
            .create(new_notification)
            .await
        {
            Ok(notification) => {
                if let Err(err) = self
                    .deps
                    .dispatcher
                    .on_notification(&notification, recipient_id)
                {
                    outcome
                        .fan_out_failures
                        .push(FanOutFailure::new(FanOutStage::NotificationEvent, err));
                }
                outcome.notification = Some(notification);
            }
            Err(err) => {
                outcome
                    .fan_out_failures
                    .push(FanOutFailure::new(FanOutStage::NotificationStore, err));
            }
        }

        Ok(outcome)
    }

    /// 有过私信往来的用户，最近联系的在前
    pub async fn list_contacts(&self, user_id: UserId) -> Result<Vec<ContactDto>, ApplicationError> {
        let contact_ids = self.deps.message_repository.list_contact_ids(user_id).await?;

        let mut contacts = Vec::with_capacity(contact_ids.len());
        for contact_id in contact_ids {
            // 已删除的用户不再出现在联系人列表
            let Some(contact) = self.deps.user_repository.find_by_id(contact_id).await? else {
                continue;
            };
            let user = contact.public();
            contacts.push(ContactDto {
                name: user.full_name.clone(),
                online: self.deps.presence.get_presence(contact_id).is_online(),
                user,
            });
        }
        Ok(contacts)
    }

    pub async fn thread(
        &self,
        user_id: UserId,
        other_id: UserId,
    ) -> Result<Vec<MessageDto>, ApplicationError> {
        let messages = self
            .deps
            .message_repository
            .list_thread(user_id, other_id, THREAD_LIMIT)
            .await?;
        Ok(messages.iter().map(MessageDto::from).collect())
    }
}
