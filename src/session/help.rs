//! Help text shown when no project is selected or a listing is requested.

use crate::agent::{ProjectDescriptor, SdkDescriptor};
use crate::args::{env_var, Param};
use crate::{APP_NAME, NATIVE_NAME};

const EXAMPLE_COMMAND: &str = "'mkdir build; cd build; cmake ..'";

/// Render the listing help.
///
/// A listing that failed to load is `None` and its section is left out;
/// the usage example needs at least one project and one SDK.
pub fn render_help(
    listing: bool,
    projects: Option<&[ProjectDescriptor]>,
    sdks: Option<&[SdkDescriptor]>,
) -> String {
    let project_env = env_var(Param::ProjectId);
    let sdk_env = env_var(Param::SdkId);
    let mut msg = String::new();

    if !listing {
        msg.push_str(&format!(
            "{} environment variable (or --id option) must be set!\n",
            project_env
        ));
    }

    if let Some(projects) = projects {
        msg.push_str(&format!(
            "List of existing projects (use: export {}=<< ID >>):\n",
            project_env
        ));
        msg.push_str(&format!("  {:<18}| Label\n", "ID"));
        for p in projects {
            msg.push_str(&format!("  {:<18}| {}", p.id, p.label));
            if !p.default_sdk.is_empty() {
                msg.push_str(&format!("   (default SDK: {})", p.default_sdk));
            }
            msg.push('\n');
        }
    }

    if let Some(sdks) = sdks {
        msg.push_str(&format!(
            "\nList of installed cross SDKs (use: export {}=<< ID >>):\n",
            sdk_env
        ));
        msg.push_str(&format!("  {:<18}| NAME\n", "ID"));
        for s in sdks {
            msg.push_str(&format!("  {:<18}| {}", s.id, s.name));
            let details: Vec<&str> = [&s.profile, &s.version, &s.arch]
                .into_iter()
                .map(String::as_str)
                .filter(|d| !d.is_empty())
                .collect();
            if !details.is_empty() {
                msg.push_str(&format!("   [{}]", details.join(" ")));
            }
            msg.push('\n');
        }
    }

    if let (Some([project, ..]), Some([sdk, ..])) = (projects, sdks) {
        msg.push_str("\nFor example:\n");
        msg.push_str(&format!(
            "  {} --id {:?} --sdkid {:?} -- {}\n",
            APP_NAME, project.id, sdk.id, EXAMPLE_COMMAND
        ));
        msg.push_str(" or\n");
        msg.push_str(&format!(
            "  {}={:?} {}={:?}  {} {}\n",
            project_env, project.id, sdk_env, sdk.id, NATIVE_NAME, EXAMPLE_COMMAND
        ));
    }

    msg
}
