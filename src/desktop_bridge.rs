//! Content-side bridge object, generated per window role.
//!
//! App windows get `window.electronAPI`, the name the packaged web UI looks
//! up; the picker gets `window.picker`. Each object only carries the verbs
//! and subscriptions granted to its role.

use crate::{
    message_channel::{allowed_verbs, event_channels, BridgeVerb},
    WindowRole, ACTIVE_USER_EVENT, USERS_EVENT,
};

pub fn bridge_global_name(role: WindowRole) -> &'static str {
    match role {
        WindowRole::Picker => "picker",
        WindowRole::Main | WindowRole::SetupWizard | WindowRole::Preferences | WindowRole::Splash => {
            "electronAPI"
        }
    }
}

fn verb_binding(verb: BridgeVerb) -> String {
    let command = verb.command();
    let body = match verb {
        BridgeVerb::PickFolder => format!(
            "(title, defaultPath) => invoke(\"{command}\", {{ title: title ?? null, defaultPath: defaultPath ?? null }})"
        ),
        BridgeVerb::HideAndOpenPicker => format!(
            "(options) => invoke(\"{command}\", {{ options: options || {{ doLogout: true }} }})"
        ),
        BridgeVerb::Choose => format!("(user) => invoke(\"{command}\", {{ user }})"),
        BridgeVerb::CloseInitWindow
        | BridgeVerb::RefreshUsers
        | BridgeVerb::OpenPreferences
        | BridgeVerb::Quit => format!("() => invoke(\"{command}\")"),
    };
    format!("    api.{} = {body};\n", verb.name())
}

fn subscription_name(channel: &str) -> Option<&'static str> {
    match channel {
        ACTIVE_USER_EVENT => Some("onActiveUser"),
        USERS_EVENT => Some("onUsers"),
        _ => None,
    }
}

/// Initialization script for windows of `role`; `None` when the role has
/// nothing to expose.
pub fn bridge_script(role: WindowRole) -> Option<String> {
    let verbs = allowed_verbs(role);
    let channels = event_channels(role);
    if verbs.is_empty() && channels.is_empty() {
        return None;
    }

    let mut bindings = String::new();
    for verb in verbs {
        bindings.push_str(&verb_binding(*verb));
    }
    for channel in channels {
        if let Some(name) = subscription_name(channel) {
            bindings.push_str(&format!(
                "    api.{name} = (callback) => subscribe(\"{channel}\", callback);\n"
            ));
        }
    }

    let global = bridge_global_name(role);
    Some(format!(
        r#"(() => {{
  if (window.{global}) return;
  const tauri = window.__TAURI__;
  if (!tauri || !tauri.core) return;
  const invoke = (command, args) => tauri.core.invoke(command, args || {{}});
  const subscribe = (channel, callback) => {{
    let active = true;
    let unlisten = null;
    tauri.webviewWindow
      .getCurrentWebviewWindow()
      .listen(channel, (event) => callback(event.payload))
      .then((stop) => {{
        if (active) unlisten = stop;
        else stop();
      }});
    return () => {{
      active = false;
      if (unlisten) {{
        unlisten();
        unlisten = null;
      }}
    }};
  }};
  const api = {{}};
{bindings}  Object.defineProperty(window, "{global}", {{
    value: Object.freeze(api),
    writable: false,
    configurable: false,
  }});
}})();
"#
    ))
}
