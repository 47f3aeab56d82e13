//! Purpose: Hold top-level CLI command dispatch for `sfwire`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every typed result is printed through its wire converter, never a serde derive.

use super::*;
use sfwire::core::codec;
use sfwire::core::value::{FromWire, ToWire};
use sfwire::model::catalog::{self, CatalogEntry, EntryKind};
use sfwire::model::health::ApplicationHealthPolicy;
use sfwire::model::image_store::ProvisionApplicationTypeDescription;
use sfwire::model::partition::PartitionId;
use sfwire::model::upgrade::ApplicationUpgradeDescription;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub(super) fn dispatch_command(
    command: Command,
    gateway: &GatewayArgs,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "sfwire", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Types { kind } => {
            let types = catalog::entries()
                .iter()
                .filter(|entry| kind.as_deref().is_none_or(|kind| entry.kind.label() == kind))
                .map(entry_json)
                .collect::<Vec<_>>();
            emit_json(json!({ "types": types }));
            Ok(RunOutcome::ok())
        }
        Command::Decode { type_name, input } => {
            let entry = lookup_entry(&type_name)?;
            let value: Value = read_input(input.as_deref())?;
            let normalized = entry.normalize(value)?;
            emit_json(normalized);
            Ok(RunOutcome::ok())
        }
        Command::Get { command } => {
            let client = gateway.client()?;
            let value = match command {
                GetCommand::UpgradeProgress { application_id } => {
                    encode(&client.get_application_upgrade_progress(&application_id)?)?
                }
                GetCommand::Services {
                    application_id,
                    continuation_token,
                } => encode(
                    &client.get_service_info_list(&application_id, continuation_token.as_deref())?,
                )?,
                GetCommand::Partitions {
                    service_id,
                    continuation_token,
                    all,
                } => {
                    if all {
                        let partitions = client.get_all_partition_info(&service_id)?;
                        json!({ "Items": codec::to_value(&partitions)? })
                    } else {
                        encode(&client.get_partition_info_list(
                            &service_id,
                            continuation_token.as_deref(),
                        )?)?
                    }
                }
                GetCommand::Partition { partition_id } => {
                    let partition_id = PartitionId::parse(&partition_id).map_err(|_| {
                        Error::new(ErrorKind::Usage)
                            .with_message(format!("partition id `{partition_id}` is not a GUID"))
                            .with_hint("Pass the GUID form, e.g. 1c3c1dcd-4a38-4ff4-b1a4-7e9d8c3b5a10.")
                    })?;
                    encode(&client.get_partition_info(&partition_id)?)?
                }
                GetCommand::ImageStore { path } => {
                    encode(&client.get_image_store_content(&path)?)?
                }
                GetCommand::ServicePackageHealth {
                    node_name,
                    application_id,
                    service_package_name,
                    events,
                    policy,
                    consider_warning_as_error,
                    max_percent_unhealthy_deployed_applications,
                } => {
                    let filter = events
                        .into_iter()
                        .fold(HealthStateFilter::DEFAULT, |acc, flag| acc | flag);
                    let policy = health_policy(
                        policy.as_deref(),
                        consider_warning_as_error,
                        max_percent_unhealthy_deployed_applications,
                    )?;
                    encode(&client.get_deployed_service_package_health_using_policy(
                        &node_name,
                        &application_id,
                        &service_package_name,
                        filter,
                        &policy,
                    )?)?
                }
            };
            emit_json(value);
            Ok(RunOutcome::ok())
        }
        Command::Upgrade {
            application_id,
            file,
            name,
            version,
        } => {
            let description = match (file, name, version) {
                (Some(path), _, _) => read_typed::<ApplicationUpgradeDescription>(&path)?,
                (None, Some(name), Some(version)) => {
                    ApplicationUpgradeDescription::rolling(name, version)
                }
                _ => {
                    return Err(Error::new(ErrorKind::Usage)
                        .with_message("upgrade needs --file or both --name and --version")
                        .with_hint("Try `sfwire upgrade shop --name fabric:/shop --version 2.0.0`."));
                }
            };
            let client = gateway.client()?;
            client.start_application_upgrade(&application_id, &description)?;
            emit_json(json!({ "accepted": true, "request": codec::to_value(&description)? }));
            Ok(RunOutcome::ok())
        }
        Command::Provision {
            image_store_path,
            is_async,
            cleanup_policy,
        } => {
            let mut description =
                ProvisionApplicationTypeDescription::image_store_path(image_store_path, is_async);
            if let ProvisionApplicationTypeDescription::ImageStorePath(provision) = &mut description
            {
                provision.application_package_cleanup_policy = cleanup_policy.map(Into::into);
            }
            let client = gateway.client()?;
            client.provision_application_type(&description)?;
            emit_json(json!({ "accepted": true, "request": codec::to_value(&description)? }));
            Ok(RunOutcome::ok())
        }
    }
}

fn encode<T: ToWire>(value: &T) -> Result<Value, Error> {
    codec::to_value(value)
}

fn entry_json(entry: &CatalogEntry) -> Value {
    let mut out = Map::new();
    out.insert("name".to_string(), json!(entry.name));
    out.insert("kind".to_string(), json!(entry.kind.label()));
    match entry.kind {
        EntryKind::Record => {}
        EntryKind::Enumeration { values } => {
            out.insert("values".to_string(), json!(values));
        }
        EntryKind::Family {
            discriminator,
            kinds,
        } => {
            out.insert("discriminator".to_string(), json!(discriminator));
            out.insert("values".to_string(), json!(kinds));
        }
    }
    Value::Object(out)
}

fn lookup_entry(type_name: &str) -> Result<&'static CatalogEntry, Error> {
    if let Some(entry) = catalog::lookup(type_name) {
        return Ok(entry);
    }
    let near = catalog::entries()
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(type_name));
    let hint = match near {
        Some(entry) => format!("Type names are case-sensitive; did you mean `{}`?", entry.name),
        None => "Run `sfwire types` to list known type names.".to_string(),
    };
    Err(Error::new(ErrorKind::Usage)
        .with_message(format!("unknown wire type `{type_name}`"))
        .with_hint(hint))
}

/// Policy from `--policy` (or empty), with inline flags taking precedence.
fn health_policy(
    path: Option<&Path>,
    consider_warning_as_error: Option<bool>,
    max_percent_unhealthy_deployed_applications: Option<i32>,
) -> Result<ApplicationHealthPolicy, Error> {
    let mut policy = match path {
        Some(path) => read_typed::<ApplicationHealthPolicy>(path)?,
        None => ApplicationHealthPolicy {
            consider_warning_as_error: None,
            max_percent_unhealthy_deployed_applications: None,
            default_service_type_health_policy: None,
            service_type_health_policy_map: None,
        },
    };
    if let Some(flag) = consider_warning_as_error {
        policy.consider_warning_as_error = Some(flag);
    }
    if let Some(percent) = max_percent_unhealthy_deployed_applications {
        policy.max_percent_unhealthy_deployed_applications = Some(percent);
    }
    Ok(policy)
}

fn read_input(input: Option<&str>) -> Result<Value, Error> {
    match input {
        None | Some("-") => codec::from_reader(io::stdin().lock()),
        Some(path) => codec::from_reader(open_file(Path::new(path))?),
    }
}

fn read_typed<T: FromWire>(path: &Path) -> Result<T, Error> {
    let mut text = String::new();
    open_file(path)?.read_to_string(&mut text).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to read {}", path.display()))
            .with_source(err)
    })?;
    codec::from_str(&text)
}

fn open_file(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|err| {
        let kind = if err.kind() == io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Io
        };
        Error::new(kind)
            .with_message(format!("cannot open {}", path.display()))
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::health_policy;
    use serde_json::json;
    use sfwire::ErrorKind;

    #[test]
    fn inline_flags_override_policy_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("policy.json");
        std::fs::write(
            &path,
            json!({
                "ConsiderWarningAsError": false,
                "MaxPercentUnhealthyDeployedApplications": 10,
                "DefaultServiceTypeHealthPolicy": {"MaxPercentUnhealthyServices": 5}
            })
            .to_string(),
        )
        .expect("write");

        let policy = health_policy(Some(&path), Some(true), None).expect("policy");
        assert_eq!(policy.consider_warning_as_error, Some(true));
        assert_eq!(policy.max_percent_unhealthy_deployed_applications, Some(10));
        assert!(policy.default_service_type_health_policy.is_some());

        let policy = health_policy(None, None, Some(25)).expect("flags only");
        assert_eq!(policy.consider_warning_as_error, None);
        assert_eq!(policy.max_percent_unhealthy_deployed_applications, Some(25));
    }

    #[test]
    fn missing_policy_file_is_not_found() {
        let err = health_policy(Some(std::path::Path::new("/no/such/policy.json")), Some(true), None)
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
