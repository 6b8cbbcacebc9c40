use std::collections::VecDeque;

use request_authz::auth::{split_permissions, DEFAULT_PERMISSIONS_DELIMITER};
use request_authz::domain::{has_permission, scope_rank, Permission};

fn print_help() {
    eprintln!(
        "\
authz-admin

USAGE:
  authz-admin <command> [options]

COMMANDS:
  check                           Decide whether a grant list satisfies a requirement
  parse <permission>              Show how a permission string is parsed
  rank <scope>                    Show the dominance rank of a scope

check OPTIONS:
  --grants <list>                 (required) Grant list as sent in X-Permissions
  --require <permission>          (required) Required resource:action:scope
  --delimiter <sep>               (default: ,)

EXIT STATUS:
  check exits 0 when allowed and 1 when denied.
"
    );
}

fn next_value(args: &mut VecDeque<String>, flag: &str) -> anyhow::Result<String> {
    args.pop_front()
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

fn main() -> anyhow::Result<()> {
    let mut args: VecDeque<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop_front() else {
        print_help();
        return Ok(());
    };

    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return Ok(());
    }

    match command.as_str() {
        "check" => {
            let mut grants: Option<String> = None;
            let mut required: Option<String> = None;
            let mut delimiter = DEFAULT_PERMISSIONS_DELIMITER.to_string();

            while let Some(arg) = args.pop_front() {
                match arg.as_str() {
                    "--grants" => grants = Some(next_value(&mut args, "--grants")?),
                    "--require" => required = Some(next_value(&mut args, "--require")?),
                    "--delimiter" => delimiter = next_value(&mut args, "--delimiter")?,
                    "-h" | "--help" => {
                        print_help();
                        return Ok(());
                    }
                    other => anyhow::bail!("unexpected argument: {other}"),
                }
            }

            let grants = grants.ok_or_else(|| anyhow::anyhow!("--grants is required"))?;
            let required = Permission::parse(
                required
                    .ok_or_else(|| anyhow::anyhow!("--require is required"))?
                    .trim(),
            );

            let grants = split_permissions(&grants, &delimiter);
            let matched = grants
                .iter()
                .find(|grant| has_permission([grant.as_str()], &required));

            match matched {
                Some(grant) => {
                    println!("allowed: {required} (granted by {grant})");
                    Ok(())
                }
                None => {
                    println!("denied: {required}");
                    std::process::exit(1);
                }
            }
        }
        "parse" => {
            let raw = next_value(&mut args, "parse")?;
            let permission = Permission::parse(raw.trim());
            let output = serde_json::json!({
                "resource": permission.resource,
                "action": permission.action,
                "scope": permission.scope,
                "scope_rank": scope_rank(&permission.scope),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        "rank" => {
            let scope = next_value(&mut args, "rank")?;
            println!("{}", scope_rank(&scope));
            Ok(())
        }
        other => {
            print_help();
            anyhow::bail!("unknown command: {other}")
        }
    }
}
