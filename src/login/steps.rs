use serde_json::{Map, Value, json};

use super::session::FlowSession;
use crate::config::{Credentials, FlowOptions};

/// One answer to a server-side login subtask, in the order the web client
/// submits them.
#[derive(Clone, PartialEq, Eq)]
pub enum SubtaskStep {
    JsInstrumentation { response: String },
    EnterUserIdentifier { username: String },
    EnterPassword { password: String },
    AccountDuplicationCheck,
}

impl SubtaskStep {
    pub fn subtask_id(&self) -> &'static str {
        match self {
            SubtaskStep::JsInstrumentation { .. } => "LoginJsInstrumentationSubtask",
            SubtaskStep::EnterUserIdentifier { .. } => "LoginEnterUserIdentifierSSO",
            SubtaskStep::EnterPassword { .. } => "LoginEnterPassword",
            SubtaskStep::AccountDuplicationCheck => "AccountDuplicationCheck",
        }
    }

    fn subtask_input(&self) -> Value {
        let id = self.subtask_id();
        match self {
            SubtaskStep::JsInstrumentation { response } => json!({
                "subtask_id": id,
                "js_instrumentation": { "response": response, "link": "next_link" },
            }),
            SubtaskStep::EnterUserIdentifier { username } => json!({
                "subtask_id": id,
                "settings_list": {
                    "setting_responses": [{
                        "key": "user_identifier",
                        "response_data": { "text_data": { "result": username } },
                    }],
                    "link": "next_link",
                },
            }),
            SubtaskStep::EnterPassword { password } => json!({
                "subtask_id": id,
                "enter_password": { "password": password, "link": "next_link" },
            }),
            SubtaskStep::AccountDuplicationCheck => json!({
                "subtask_id": id,
                "check_logged_in_account": { "link": "AccountDuplicationCheck_false" },
            }),
        }
    }

    /// Full request body: the current flow token plus this step's input.
    pub fn payload(&self, session: &FlowSession) -> Value {
        json!({
            "flow_token": session.flow_token,
            "subtask_inputs": [self.subtask_input()],
        })
    }
}

impl std::fmt::Debug for SubtaskStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.subtask_id())
    }
}

pub fn login_steps(credentials: &Credentials, options: &FlowOptions) -> Vec<SubtaskStep> {
    vec![
        SubtaskStep::JsInstrumentation {
            response: options.js_instrumentation.clone(),
        },
        SubtaskStep::EnterUserIdentifier {
            username: credentials.username.clone(),
        },
        SubtaskStep::EnterPassword {
            password: credentials.password.clone(),
        },
        SubtaskStep::AccountDuplicationCheck,
    ]
}

/// Subtask versions the web client advertises when it starts a flow.
const SUBTASK_VERSIONS: &[(&str, u64)] = &[
    ("action_list", 2),
    ("alert_dialog", 1),
    ("app_download_cta", 1),
    ("check_logged_in_account", 1),
    ("choice_selection", 3),
    ("contacts_live_sync_permission_prompt", 0),
    ("cta", 7),
    ("email_verification", 2),
    ("end_flow", 1),
    ("enter_date", 1),
    ("enter_email", 2),
    ("enter_password", 5),
    ("enter_phone", 2),
    ("enter_recaptcha", 1),
    ("enter_text", 5),
    ("enter_username", 2),
    ("generic_urt", 3),
    ("in_app_notification", 1),
    ("interest_picker", 3),
    ("js_instrumentation", 1),
    ("menu_dialog", 1),
    ("notifications_permission_prompt", 2),
    ("open_account", 2),
    ("open_home_timeline", 1),
    ("open_link", 1),
    ("phone_verification", 4),
    ("privacy_options", 1),
    ("security_key", 3),
    ("select_avatar", 4),
    ("select_banner", 2),
    ("settings_list", 7),
    ("show_code", 1),
    ("sign_up", 2),
    ("sign_up_review", 4),
    ("tweet_selection_urt", 1),
    ("update_users", 1),
    ("upload_media", 1),
    ("user_recommendations_list", 4),
    ("user_recommendations_urt", 1),
    ("wait_spinner", 3),
    ("web_modal", 1),
];

/// Body for the flow-start request when the subtask version table is sent.
pub fn start_flow_body() -> Value {
    let versions: Map<String, Value> = SUBTASK_VERSIONS
        .iter()
        .map(|(name, version)| (name.to_string(), Value::from(*version)))
        .collect();

    json!({
        "input_flow_data": {
            "flow_context": {
                "debug_overrides": {},
                "start_location": { "location": "unknown" },
            },
        },
        "subtask_versions": versions,
    })
}
