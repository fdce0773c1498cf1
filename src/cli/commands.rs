//! Command dispatch: one handler per subcommand
//!
//! Handlers validate options, call a service and render the result. They
//! return the process exit code; errors bubble up as `CliError`.

use std::fs;
use std::io;
use std::time::Duration;

use clap::CommandFactory;
use clap_complete::generate;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{RegisterRequest, ReleaseSource, SystemChanges};
use crate::cli::args::{
    fact_pairs, group_names, Cli, Commands, ConfigCommands, OrgArg, PackageActionArgs, SystemArgs,
};
use crate::cli::output;
use crate::cli::printer::{bracket_list, format_date, row, Printer, Row, Show, Strategy};
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_dir, global_config_path, Settings};
use crate::domain::{
    Entitlement, PackageAction, PoolFilter, ReportFormat, System, SystemRef, Task,
    UnsubscribeTarget,
};
use crate::exitcode;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run a command that needs no server connection, or connect and dispatch.
pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    match &cli.command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(exitcode::OK)
        }
        Commands::Config { command } => cmd_config(cli, command),
        _ => {
            let settings = load_settings(cli)?;
            let container = ServiceContainer::new(settings)?;
            dispatch(cli, &container)
        }
    }
}

/// Settings from file and environment, with command line flags on top.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        settings.server.url = url.clone();
    }
    if let Some(username) = &cli.username {
        settings.server.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        settings.server.password = Some(password.clone());
    }
    if let Some(secs) = cli.task_timeout {
        settings.tasks.timeout_secs = Some(secs);
    }
    Ok(settings)
}

/// Execute a server command against the given container.
pub fn dispatch(cli: &Cli, container: &ServiceContainer) -> CliResult<i32> {
    let ctx = Context {
        services: container,
        strategy: Strategy::from_flags(cli.verbose, cli.grep),
    };
    match &cli.command {
        Commands::List {
            org,
            environment,
            pool_id,
        } => ctx.list(org, environment.as_deref(), pool_id.as_deref()),
        Commands::Info {
            org,
            system,
            environment,
        } => ctx.info(org, system, environment.as_deref()),
        Commands::Packages {
            org,
            system,
            environment,
            actions,
        } => ctx.packages(org, system, environment.as_deref(), actions),
        Commands::Tasks {
            org,
            system,
            environment,
        } => ctx.tasks(org, system, environment.as_deref()),
        Commands::TaskInfo { id } => ctx.task_info(id),
        Commands::Releases {
            org,
            name,
            uuid,
            environment,
        } => ctx.releases(org, name.as_deref(), uuid.as_deref(), environment.as_deref()),
        Commands::Facts {
            org,
            system,
            environment,
        } => ctx.facts(org, system, environment.as_deref()),
        Commands::Register {
            name,
            org,
            environment,
            servicelevel,
            activationkey,
            release,
            fact,
        } => {
            let request = RegisterRequest {
                name: name.clone(),
                org: ctx.org(org)?,
                environment: environment.clone(),
                activation_keys: group_names(activationkey),
                release: release.clone(),
                service_level: servicelevel.clone(),
                facts: fact_pairs(fact).into_iter().collect(),
            };
            ctx.register(request)
        }
        Commands::Unregister {
            org,
            system,
            environment,
        } => ctx.unregister(org, system, environment.as_deref()),
        Commands::RemoveDeletion { uuid } => ctx.remove_deletion(uuid),
        Commands::Subscribe {
            org,
            system,
            pool,
            quantity,
        } => ctx.subscribe(org, system, pool, *quantity),
        Commands::Subscriptions {
            org,
            system,
            available,
            match_system,
            match_installed,
            no_overlap,
        } => {
            let filter = available.then_some(PoolFilter {
                match_system: *match_system,
                match_installed: *match_installed,
                no_overlap: *no_overlap,
            });
            ctx.subscriptions(org, system, filter)
        }
        Commands::Unsubscribe {
            org,
            system,
            entitlement,
            serial,
            all,
        } => {
            let target = match (entitlement, serial, all) {
                (_, _, true) => UnsubscribeTarget::All,
                (_, Some(serial), false) => UnsubscribeTarget::Serial(serial.clone()),
                (Some(id), None, false) => UnsubscribeTarget::Entitlement(id.clone()),
                (None, None, false) => {
                    return Err(CliError::Usage(
                        "one of --entitlement, --serial or --all is required".into(),
                    ))
                }
            };
            ctx.unsubscribe(org, system, &target)
        }
        Commands::Update {
            org,
            system,
            environment,
            new_name,
            new_environment,
            description,
            location,
            release,
            servicelevel,
        } => {
            let changes = SystemChanges {
                name: new_name.clone(),
                environment: new_environment.clone(),
                description: description.clone(),
                location: location.clone(),
                release: release.clone(),
                service_level: servicelevel.clone(),
            };
            ctx.update(org, system, environment.as_deref(), changes)
        }
        Commands::Report {
            org,
            environment,
            format,
        } => ctx.report(org, environment.as_deref(), format),
        Commands::AddSystemGroups {
            org,
            system,
            system_groups,
        } => ctx.system_groups(org, system, system_groups, true),
        Commands::RemoveSystemGroups {
            org,
            system,
            system_groups,
        } => ctx.system_groups(org, system, system_groups, false),
        Commands::AddCustomInfo {
            org,
            system,
            environment,
            keyname,
            value,
        } => ctx.add_custom_info(org, system, environment.as_deref(), keyname, value),
        Commands::ViewCustomInfo {
            org,
            system,
            environment,
            keyname,
        } => ctx.view_custom_info(org, system, environment.as_deref(), keyname.as_deref()),
        Commands::UpdateCustomInfo {
            org,
            system,
            environment,
            keyname,
            current_value,
            new_value,
        } => ctx.update_custom_info(
            org,
            system,
            environment.as_deref(),
            keyname,
            current_value,
            new_value,
        ),
        Commands::RemoveCustomInfo {
            org,
            system,
            environment,
            keyname,
            value,
        } => ctx.remove_custom_info(
            org,
            system,
            environment.as_deref(),
            keyname,
            value.as_deref(),
        ),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not talk to the server".into(),
        )),
    }
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let state = if path.exists() { "exists" } else { "not found" };
                    output::info(&format!("global: {} ({})", path.display(), state));
                }
                None => output::warning("no config directory on this platform"),
            }
            if let Some(path) = &cli.config {
                output::info(&format!("--config: {}", path.display()));
            }
        }
        ConfigCommands::Init { force } => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => global_config_path()
                    .ok_or_else(|| CliError::Usage("no config directory, use --config".into()))?,
            };
            if path.exists() && !force {
                return Err(CliError::Usage(format!(
                    "{} exists, use --force to overwrite",
                    path.display()
                )));
            }
            if cli.config.is_none() {
                if let Some(dir) = global_config_dir() {
                    fs::create_dir_all(&dir)
                        .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
                }
            }
            fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("Created {}", path.display()));
        }
    }
    Ok(exitcode::OK)
}

struct Context<'a> {
    services: &'a ServiceContainer,
    strategy: Strategy,
}

impl Context<'_> {
    fn printer(&self) -> Printer {
        Printer::new(self.strategy)
    }

    fn org(&self, arg: &OrgArg) -> CliResult<String> {
        arg.org
            .clone()
            .or_else(|| self.services.settings.defaults.org.clone())
            .ok_or_else(|| CliError::Usage("--org is required (or set defaults.org)".into()))
    }

    #[instrument(skip(self))]
    fn list(
        &self,
        org: &OrgArg,
        environment: Option<&str>,
        pool_id: Option<&str>,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let systems = self.services.systems.list(&org, environment, pool_id)?;

        let mut printer = self.printer();
        printer.set_header(match environment {
            Some(env) => format!("Systems List For Environment [ {env} ] in Org [ {org} ]"),
            None => format!("Systems List For Org [ {org} ]"),
        });
        printer
            .add_column("name")
            .add_column("uuid")
            .add_column("ipv4_address")
            .add_labeled("serviceLevel", "Service Level");
        let rows: Vec<Row> = systems
            .iter()
            .map(|s| {
                row([
                    ("name", s.name.clone()),
                    ("uuid", s.uuid.clone()),
                    ("ipv4_address", s.ipv4_address.clone().unwrap_or_default()),
                    ("serviceLevel", s.service_level.clone().unwrap_or_default()),
                ])
            })
            .collect();
        printer.print_items(&rows);
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn info(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let details = self
            .services
            .systems
            .details(&org, &reference, environment)?;
        let s = &details.system;

        let mut printer = self.printer();
        printer.set_header(match (&reference, environment) {
            (SystemRef::Uuid(uuid), _) => format!("System Information [ {uuid} ]"),
            (_, None) => format!("System Information For Org [ {org} ]"),
            (_, Some(env)) => {
                format!("System Information For Environment [ {env} ] in Org [ {org} ]")
            }
        });
        printer
            .add_column("name")
            .add_column("ipv4_address")
            .add_column("uuid")
            .add_column("location")
            .add_labeled("created_at", "Registered")
            .add_labeled("updated_at", "Last updated")
            .add_column("description");
        if s.release_ver.as_deref().is_some_and(|r| !r.is_empty()) {
            printer.add_labeled("releaseVer", "OS release");
        }
        printer
            .add("activation_keys", "Activation Keys", Show::Verbose)
            .add("host", "Host", Show::Verbose)
            .add_labeled("serviceLevel", "Service Level")
            .add("guests", "Guests", Show::Verbose);
        if s.template.is_some() {
            printer.add("template", "Template", Show::Verbose);
        }
        printer.add("custom_info", "Custom Info", Show::Verbose);

        let custom_info = bracket_list(
            details
                .custom_info
                .iter()
                .map(|(k, values)| format!("{}: {}", k, bracket_list(values))),
        );
        let item = row([
            ("name", s.name.clone()),
            ("ipv4_address", s.ipv4_address.clone().unwrap_or_default()),
            ("uuid", s.uuid.clone()),
            ("location", s.location.clone().unwrap_or_default()),
            ("created_at", date(s.created_at.as_deref())),
            ("updated_at", date(s.updated_at.as_deref())),
            ("description", s.description.clone().unwrap_or_default()),
            ("releaseVer", s.release_ver.clone().unwrap_or_default()),
            (
                "activation_keys",
                bracket_list(s.activation_key.iter().map(|k| &k.name)),
            ),
            (
                "host",
                s.host.as_ref().map(|h| h.name.clone()).unwrap_or_default(),
            ),
            ("serviceLevel", s.service_level.clone().unwrap_or_default()),
            ("guests", bracket_list(s.guests.iter().map(|g| &g.name))),
            (
                "template",
                s.template
                    .as_ref()
                    .map(|t| t.name.clone())
                    .unwrap_or_default(),
            ),
            ("custom_info", custom_info),
        ]);
        printer.print_item(&item);
        Ok(exitcode::OK)
    }

    #[instrument(skip(self, actions))]
    fn packages(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
        actions: &PackageActionArgs,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let action = PackageAction::from_options(actions.clone().into())?;
        let target = self
            .services
            .systems
            .system(&org, &reference, environment)?;

        if let Some(action) = action {
            return self.package_action(&target, &action);
        }

        let packages = self.services.packages.installed(&target.uuid)?;
        let mut printer = self.printer();
        printer.set_header(match environment {
            Some(env) => format!(
                "Package Information for System [ {reference} ] in Environment [ {env} ] in Org [ {org} ]"
            ),
            None => format!("Package Information for System [ {reference} ] in Org [ {org} ]"),
        });
        printer
            .add("name", "Name", Show::Verbose)
            .add("vendor", "Vendor", Show::Verbose)
            .add("version", "Version", Show::Verbose)
            .add("release", "Release", Show::Verbose)
            .add("arch", "Arch", Show::Verbose)
            .add("nvra", "Name Version Release Arch", Show::Compact);
        let rows: Vec<Row> = packages
            .iter()
            .map(|p| {
                row([
                    ("name", p.name.clone()),
                    ("vendor", p.vendor.clone()),
                    ("version", p.version.clone()),
                    ("release", p.release.clone()),
                    ("arch", p.arch.clone()),
                    ("nvra", p.nvra()),
                ])
            })
            .collect();
        printer.print_items(&rows);
        Ok(exitcode::OK)
    }

    /// Start the action, wait for the task and report its outcome once.
    fn package_action(&self, system: &System, action: &PackageAction) -> CliResult<i32> {
        let task = self.services.packages.start(&system.uuid, action)?;
        output::info(&format!("Performing remote action [ {} ]... ", task.uuid));

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(120));
        let result = self.services.packages.wait(&task, |snapshot| {
            spinner.set_message(format!("task {}", snapshot.state.as_str()));
        });
        spinner.finish_and_clear();
        let task = result?;

        if task.state.succeeded() {
            output::success(&"Remote action finished:");
            output::info(&task.result_description);
            Ok(exitcode::OK)
        } else {
            output::failure(&"Remote action failed:");
            output::info(&task.result_description);
            Ok(exitcode::DATAERR)
        }
    }

    #[instrument(skip(self))]
    fn tasks(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let tasks = self.services.systems.tasks(&org, &reference, environment)?;

        let mut printer = self.printer();
        printer.set_header("Remote tasks");
        printer
            .add_labeled("uuid", "Task ID")
            .add_labeled("system_name", "System")
            .add_labeled("description", "Action")
            .add("created_at", "Started", Show::Verbose)
            .add("finish_time", "Finished", Show::Verbose)
            .add_labeled("state", "Status")
            .add("result", "Result", Show::Verbose);
        let rows: Vec<Row> = tasks.iter().map(task_row).collect();
        printer.print_items(&rows);
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn task_info(&self, id: &str) -> CliResult<i32> {
        let task = self.services.systems.task(id)?;
        let mut printer = self.printer();
        printer.set_header("Remote task");
        printer
            .add_labeled("system_name", "System")
            .add_labeled("description", "Action")
            .add_labeled("created_at", "Started")
            .add_labeled("finish_time", "Finished")
            .add_labeled("state", "Status")
            .add_labeled("result", "Result");
        printer.print_item(&task_row(&task));
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn releases(
        &self,
        org: &OrgArg,
        name: Option<&str>,
        uuid: Option<&str>,
        environment: Option<&str>,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let source = match (uuid, name, environment) {
            (Some(uuid), _, _) => ReleaseSource::System(SystemRef::Uuid(uuid.to_string())),
            (None, Some(name), _) => ReleaseSource::System(SystemRef::Name(name.to_string())),
            (None, None, Some(env)) => ReleaseSource::Environment(env.to_string()),
            (None, None, None) => {
                return Err(CliError::Usage(
                    "one of --name, --uuid or --environment is required".into(),
                ))
            }
        };
        let releases = self.services.systems.releases(&org, &source)?;

        let mut printer = self.printer();
        printer.set_header("Available releases");
        printer.add_column("value");
        let rows: Vec<Row> = releases.into_iter().map(|r| row([("value", r)])).collect();
        printer.print_items(&rows);
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn facts(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let target = self
            .services
            .systems
            .system(&org, &reference, environment)?;

        let mut printer = self.printer();
        printer.set_header(match environment {
            Some(env) => format!(
                "System Facts For System [ {reference} ] in Environment [ {env} ] in Org [ {org} ]"
            ),
            None => format!("System Facts For System [ {reference} ] in Org [ {org} ]"),
        });
        // BTreeMap iteration keeps the keys sorted
        let mut item = Row::new();
        for (key, value) in &target.facts {
            printer.add_labeled(key, key);
            item.insert(key.clone(), scalar(value));
        }
        printer.print_item(&item);
        Ok(exitcode::OK)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    fn register(&self, request: RegisterRequest) -> CliResult<i32> {
        let name = request.name.clone();
        let system = self.services.systems.register(request)?;
        debug!("registered uuid {}", system.uuid);
        output::success(&format!("Successfully registered system [ {name} ]"));
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn unregister(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let removed = self
            .services
            .systems
            .unregister(&org, &reference, environment)?;
        output::success(&format!(
            "Successfully unregistered System [ {} ]",
            display_name(&removed, &reference)
        ));
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn remove_deletion(&self, uuid: &str) -> CliResult<i32> {
        self.services.systems.remove_deletion_record(uuid)?;
        output::success(&format!(
            "Successfully removed deletion record for hypervisor with uuid [ {uuid} ]"
        ));
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn subscribe(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        pool: &str,
        quantity: u32,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let uuid = self.services.resolver.uuid(&org, &reference)?;
        self.services.subscriptions.subscribe(&uuid, pool, quantity)?;
        output::success(&format!("Successfully subscribed System [ {reference} ]"));
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn subscriptions(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        available: Option<PoolFilter>,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let uuid = self.services.resolver.uuid(&org, &reference)?;

        let mut printer = self.printer();
        printer.prefer(Strategy::Verbose);
        let rows: Vec<Row> = match available {
            None => {
                let entitlements = self.services.subscriptions.current(&uuid)?;
                if entitlements.is_empty() {
                    output::info(&format!(
                        "No Subscriptions found for System [ {reference} ] in Org [ {org} ]"
                    ));
                    return Ok(exitcode::OK);
                }
                printer.set_header(format!("Current Subscriptions for System [ {reference} ]"));
                printer
                    .add_column("entitlementId")
                    .add_labeled("serialIds", "Serial ID")
                    .add_column("poolName")
                    .add_column("expires")
                    .add_column("consumed")
                    .add_column("quantity")
                    .add_column("sla")
                    .add_column("contractNumber")
                    .add_labeled("providedProducts", "Provided products");
                entitlements.iter().map(entitlement_row).collect()
            }
            Some(filter) => {
                let pools = self.services.subscriptions.available(&uuid, filter)?;
                if pools.is_empty() {
                    output::info(&format!(
                        "No Pools found for System [ {reference} ] in Org [ {org} ]"
                    ));
                    return Ok(exitcode::OK);
                }
                printer.set_header(format!("Available Subscriptions for System [ {reference} ]"));
                printer
                    .add_column("id")
                    .add_labeled("productName", "Name")
                    .add_column("endDate")
                    .add_column("consumed")
                    .add_column("quantity")
                    .add_column("sockets")
                    .add_labeled("stacking_id", "Stacking ID")
                    .add_labeled("multi-entitlement", "Multi-entitlement")
                    .add_labeled("providedProducts", "Provided products");
                pools
                    .iter()
                    .map(|p| {
                        let quantity = if p.is_unlimited() {
                            "Unlimited".to_string()
                        } else {
                            p.quantity.to_string()
                        };
                        row([
                            ("id", p.id.clone()),
                            ("productName", p.product_name.clone()),
                            ("endDate", p.end_date.clone().unwrap_or_default()),
                            ("consumed", opt(p.consumed)),
                            ("quantity", quantity),
                            ("sockets", p.sockets.as_ref().map(scalar).unwrap_or_default()),
                            (
                                "stacking_id",
                                p.attribute("stacking_id").map(scalar).unwrap_or_default(),
                            ),
                            (
                                "multi-entitlement",
                                p.attribute("multi-entitlement")
                                    .map(scalar)
                                    .unwrap_or_default(),
                            ),
                            (
                                "providedProducts",
                                p.provided_products.iter().map(|pp| &pp.product_name).join(", "),
                            ),
                        ])
                    })
                    .collect()
            }
        };
        printer.print_items(&rows);
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn unsubscribe(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        target: &UnsubscribeTarget,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let uuid = self.services.resolver.uuid(&org, &reference)?;
        self.services.subscriptions.unsubscribe(&uuid, target)?;
        output::success(&format!("Successfully unsubscribed System [ {reference} ]"));
        Ok(exitcode::OK)
    }

    #[instrument(skip(self, changes))]
    fn update(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
        changes: SystemChanges,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let before = self
            .services
            .systems
            .update(&org, &reference, environment, changes)?;
        output::success(&format!("Successfully updated system [ {} ]", before.name));
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn report(&self, org: &OrgArg, environment: Option<&str>, format: &str) -> CliResult<i32> {
        let org = self.org(org)?;
        let format: ReportFormat = format.parse()?;
        let report = self.services.reports.fetch(&org, environment, format)?;
        if format.is_attachment() {
            let path = self.services.reports.save(&report)?;
            output::success(&format!("Report saved to {}", path.display()));
        } else {
            output::info(&String::from_utf8_lossy(&report.body));
        }
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn system_groups(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        names: &[String],
        add: bool,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let names = group_names(names);
        if names.is_empty() {
            return Err(CliError::Usage("--system_groups must name at least one group".into()));
        }
        if add {
            let updated = self.services.groups.add(&org, &reference, &names)?;
            output::success(&format!(
                "Successfully added system groups to system [ {} ]",
                updated.name
            ));
        } else {
            let updated = self.services.groups.remove(&org, &reference, &names)?;
            output::success(&format!(
                "Successfully removed system groups from system [ {} ]",
                updated.name
            ));
        }
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn add_custom_info(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
        keyname: &str,
        value: &str,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let target = self
            .services
            .systems
            .system(&org, &reference, environment)?;
        if self.services.custom_info.add(&target, keyname, value)? {
            output::success(&format!(
                "Successfully added Custom Information [ {keyname} : {value} ] to System [ {reference} ]"
            ));
            Ok(exitcode::OK)
        } else {
            output::failure(&format!(
                "Could not add Custom Information [ {keyname} : {value} ] to System [ {reference} ]"
            ));
            Ok(exitcode::DATAERR)
        }
    }

    #[instrument(skip(self))]
    fn view_custom_info(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
        keyname: Option<&str>,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let target = self
            .services
            .systems
            .system(&org, &reference, environment)?;
        let info = self.services.custom_info.view(&target, keyname)?;

        let mut printer = self.printer();
        printer.set_header(match (&reference, environment) {
            (SystemRef::Uuid(uuid), _) => format!("Custom Information For System [ {uuid} ]"),
            (_, None) => format!("Custom Information For System [ {reference} ] in Org [ {org} ]"),
            (_, Some(env)) => format!(
                "Custom Information For System [ {reference} ] in Environment [ {env} ] in Org [ {org} ]"
            ),
        });
        let mut item = Row::new();
        for (key, values) in &info {
            printer.add_labeled(key, key);
            item.insert(key.clone(), values.join(", "));
        }
        printer.print_item(&item);
        Ok(exitcode::OK)
    }

    #[instrument(skip(self))]
    fn update_custom_info(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
        keyname: &str,
        current: &str,
        new: &str,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let target = self
            .services
            .systems
            .system(&org, &reference, environment)?;
        if self
            .services
            .custom_info
            .update(&target, keyname, current, new)?
        {
            output::success(&format!(
                "Successfully updated Custom Information for System [ {reference} ]"
            ));
            Ok(exitcode::OK)
        } else {
            output::failure(&format!(
                "Could not update Custom Information for System [ {reference} ]"
            ));
            Ok(exitcode::DATAERR)
        }
    }

    #[instrument(skip(self))]
    fn remove_custom_info(
        &self,
        org: &OrgArg,
        system: &SystemArgs,
        environment: Option<&str>,
        keyname: &str,
        value: Option<&str>,
    ) -> CliResult<i32> {
        let org = self.org(org)?;
        let reference = system_ref(system)?;
        let target = self
            .services
            .systems
            .system(&org, &reference, environment)?;
        if self.services.custom_info.remove(&target, keyname, value)? {
            output::success(&format!(
                "Successfully removed Custom Information from System [ {reference} ]"
            ));
            Ok(exitcode::OK)
        } else {
            output::failure(&format!(
                "Could not remove Custom Information from System [ {reference} ]"
            ));
            Ok(exitcode::DATAERR)
        }
    }
}

fn system_ref(args: &SystemArgs) -> CliResult<SystemRef> {
    Ok(SystemRef::from_options(
        args.name.as_deref(),
        args.uuid.as_deref(),
    )?)
}

/// Name from the server record, the user's reference when the record has none.
fn display_name<'a>(system: &'a System, reference: &'a SystemRef) -> &'a str {
    if system.name.is_empty() {
        reference.as_str()
    } else {
        &system.name
    }
}

fn date(raw: Option<&str>) -> String {
    raw.map(format_date).unwrap_or_default()
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// JSON scalar without quotes around strings.
fn scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn task_row(task: &Task) -> Row {
    row([
        ("uuid", task.uuid.clone()),
        ("system_name", task.system_name.clone().unwrap_or_default()),
        ("description", task.description.clone().unwrap_or_default()),
        ("created_at", date(task.created_at.as_deref())),
        ("finish_time", date(task.finish_time.as_deref())),
        ("state", task.state.as_str().to_string()),
        ("result", format!("\n{}", task.result_description)),
    ])
}

fn entitlement_row(e: &Entitlement) -> Row {
    row([
        ("entitlementId", e.entitlement_id.clone()),
        ("serialIds", e.serials.iter().map(|s| scalar(&s.id)).join(", ")),
        ("poolName", e.pool_name.clone()),
        ("expires", e.expires.clone().unwrap_or_default()),
        ("consumed", opt(e.consumed)),
        ("quantity", opt(e.quantity)),
        ("sla", e.sla.clone().unwrap_or_default()),
        ("contractNumber", e.contract_number.clone().unwrap_or_default()),
        (
            "providedProducts",
            e.provided_products.iter().map(|p| &p.name).join(", "),
        ),
    ])
}
