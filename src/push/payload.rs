use crate::types::push::{NotificationPayload, Trigger};

pub const DEFAULT_TITLE: &str = "New Message!";

pub const ON_PAGE_LOAD_BODY: &str = "Welcome to Yulia's Draw and Chat App!";
pub const NEW_SUBSCRIPTION_BODY: &str = "Yulia's DrawChat: New notification subscription created!";
pub const EXISTING_SUBSCRIPTION_BODY: &str = "Welcome back! We are happy to see you again!";
pub const DEFAULT_BODY: &str = "Welcome to the App!";

pub fn build(trigger: &Trigger) -> NotificationPayload {
    build_with_title(trigger, DEFAULT_TITLE)
}

pub fn build_with_title(trigger: &Trigger, title: &str) -> NotificationPayload {
    NotificationPayload {
        title: title.to_string(),
        body: body_for(trigger).to_string(),
    }
}

fn body_for(trigger: &Trigger) -> &'static str {
    match trigger {
        Trigger::OnPageLoad => ON_PAGE_LOAD_BODY,
        Trigger::NewSubscription => NEW_SUBSCRIPTION_BODY,
        Trigger::ExistingSubscription => EXISTING_SUBSCRIPTION_BODY,
        Trigger::Other(_) => DEFAULT_BODY,
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn build__should_map_known_triggers_to_their_bodies() {
        assert_eq!(build(&Trigger::OnPageLoad).body, ON_PAGE_LOAD_BODY);
        assert_eq!(build(&Trigger::NewSubscription).body, NEW_SUBSCRIPTION_BODY);
        assert_eq!(
            build(&Trigger::ExistingSubscription).body,
            EXISTING_SUBSCRIPTION_BODY
        );
    }

    #[test]
    fn build__should_fall_back_to_default_body_for_unknown_triggers() {
        for raw in ["xyz", "", "OnPageLoad", "default"] {
            let payload = build(&Trigger::from(raw));

            assert_eq!(payload.title, DEFAULT_TITLE);
            assert_eq!(payload.body, DEFAULT_BODY, "trigger {raw:?}");
        }
    }

    #[test]
    fn build_with_title__should_keep_custom_title() {
        let payload = build_with_title(&Trigger::OnPageLoad, "Hello");

        assert_eq!(
            payload,
            NotificationPayload {
                title: "Hello".to_string(),
                body: ON_PAGE_LOAD_BODY.to_string(),
            }
        );
    }
}
