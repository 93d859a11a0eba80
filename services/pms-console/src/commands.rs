//! CLI surface and command dispatch

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use common::Secret;
use gateway::{Gateway, LOGIN_FAILED_MESSAGE, REGISTER_FAILED_MESSAGE};
use serde::Serialize;
use session::{LoginCredentials, RegisterCredentials};
use transport::FilePart;

use crate::api::{self, data_filling, employees, templates};
use crate::error::Error;

/// Command-line client for the PMS backend
#[derive(Debug, Parser)]
#[command(name = "pms-console", version)]
pub struct Cli {
    /// Config file (default: $CONFIG_PATH or ./pms-console.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PMS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PMS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Rotate the access token now
    Refresh,
    /// Employee directory
    #[command(subcommand)]
    Employees(EmployeesCommand),
    /// Excel header templates
    #[command(subcommand)]
    Templates(TemplatesCommand),
    /// Data-filling batches
    #[command(subcommand)]
    DataFill(DataFillCommand),
}

impl Command {
    /// Commands that establish a session rather than use one.
    pub fn opens_session(&self) -> bool {
        matches!(self, Command::Login { .. } | Command::Register { .. })
    }
}

#[derive(Debug, Subcommand)]
pub enum EmployeesCommand {
    List,
    /// Candidate managers for --reports-to
    Managers,
    Create(EmployeeArgs),
    Update {
        id: String,
        #[command(flatten)]
        employee: EmployeeArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct EmployeeArgs {
    #[arg(long)]
    pub employee_id: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub designation: String,
    #[arg(long, default_value = "")]
    pub division: String,
    #[arg(long, default_value = "")]
    pub geography: String,
    #[arg(long, default_value = "")]
    pub department: String,
    /// Manager's id; omit for none
    #[arg(long)]
    pub reports_to: Option<String>,
}

impl From<EmployeeArgs> for employees::EmployeeInput {
    fn from(args: EmployeeArgs) -> Self {
        Self {
            employee_id: args.employee_id,
            name: args.name,
            email: args.email,
            designation: args.designation,
            division: args.division,
            geography: args.geography,
            department: args.department,
            reports_to: args.reports_to,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    List,
    /// Fetch a template by name (default PMS-APAC-Header)
    Get { name: Option<String> },
    /// Search templates by name
    Find { name: String },
    /// Register a header template from a spreadsheet
    Upload {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Save a template workbook
    Download {
        id: String,
        /// Used for the default file name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum DataFillCommand {
    Templates,
    History,
    Preview {
        template_id: String,
    },
    /// Save the blank workbook of a template
    Download {
        template_id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Upload a filled workbook as a new batch
    Upload {
        file: PathBuf,
        #[arg(long)]
        template_id: String,
    },
    Calculated {
        batch_id: String,
    },
    /// Save the filled workbook of a batch
    Export {
        batch_id: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Run one command. JSON results go to stdout.
pub async fn execute(command: Command, gateway: &Gateway) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let credentials = LoginCredentials {
                email,
                password: Secret::new(password),
            };
            let user = gateway
                .login(&credentials)
                .await
                .map_err(|e| anyhow!(e.message_or(LOGIN_FAILED_MESSAGE)))?;
            println!("Logged in as {}", user.display_name());
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
        } => {
            let credentials = RegisterCredentials {
                first_name,
                last_name,
                email,
                password: Secret::new(password),
            };
            let user = gateway
                .register(&credentials)
                .await
                .map_err(|e| anyhow!(e.message_or(REGISTER_FAILED_MESSAGE)))?;
            println!("Registered and logged in as {}", user.display_name());
        }
        Command::Logout => {
            gateway.logout().await;
            println!("Logged out");
        }
        Command::Whoami => {
            let snapshot = gateway.current_session().await;
            let user = match (snapshot.authenticated, snapshot.user) {
                (true, Some(user)) => user,
                _ => return Err(Error::NotLoggedIn.into()),
            };
            print_json(&user)?;
        }
        Command::Refresh => {
            require_session(gateway).await?;
            gateway.refresh().await?;
            println!("Access token refreshed");
        }
        Command::Employees(command) => {
            require_session(gateway).await?;
            run_employees(command, gateway).await?;
        }
        Command::Templates(command) => {
            require_session(gateway).await?;
            run_templates(command, gateway).await?;
        }
        Command::DataFill(command) => {
            require_session(gateway).await?;
            run_data_fill(command, gateway).await?;
        }
    }
    Ok(())
}

async fn run_employees(command: EmployeesCommand, gateway: &Gateway) -> Result<()> {
    match command {
        EmployeesCommand::List => print_json(&employees::list(gateway).await?),
        EmployeesCommand::Managers => print_json(&employees::dropdown(gateway).await?),
        EmployeesCommand::Create(args) => {
            let created = employees::create(gateway, &args.into()).await?;
            eprintln!("Employee created successfully");
            print_json(&created)
        }
        EmployeesCommand::Update { id, employee } => {
            let updated = employees::update(gateway, &id, &employee.into()).await?;
            eprintln!("Employee updated successfully");
            print_json(&updated)
        }
        EmployeesCommand::Delete { id } => {
            employees::delete(gateway, &id).await?;
            eprintln!("Employee deleted successfully");
            Ok(())
        }
    }
}

async fn run_templates(command: TemplatesCommand, gateway: &Gateway) -> Result<()> {
    match command {
        TemplatesCommand::List => print_json(&templates::list(gateway).await?),
        TemplatesCommand::Get { name } => print_json(&templates::get(gateway, name.as_deref()).await?),
        TemplatesCommand::Find { name } => print_json(&templates::find(gateway, &name).await?),
        TemplatesCommand::Upload {
            file,
            name,
            description,
        } => {
            let part = read_spreadsheet(&file).await?;
            let result =
                templates::upload(gateway, part, name.as_deref(), description.as_deref()).await?;
            eprintln!("Template uploaded successfully!");
            print_json(&result)
        }
        TemplatesCommand::Download { id, name, out } => {
            let bytes = templates::download(gateway, &id).await?;
            let path = out.unwrap_or_else(|| xlsx_name(name.as_deref().unwrap_or(&id)));
            save(&path, &bytes).await
        }
        TemplatesCommand::Delete { id } => {
            templates::delete(gateway, &id).await?;
            eprintln!("Template deleted successfully!");
            Ok(())
        }
    }
}

async fn run_data_fill(command: DataFillCommand, gateway: &Gateway) -> Result<()> {
    match command {
        DataFillCommand::Templates => print_json(&data_filling::templates(gateway).await?),
        DataFillCommand::History => print_json(&data_filling::history(gateway).await?),
        DataFillCommand::Preview { template_id } => {
            print_json(&data_filling::preview(gateway, &template_id).await?)
        }
        DataFillCommand::Download { template_id, out } => {
            let bytes = data_filling::download(gateway, &template_id).await?;
            save(&out.unwrap_or_else(|| xlsx_name(&template_id)), &bytes).await
        }
        DataFillCommand::Upload { file, template_id } => {
            let part = read_spreadsheet(&file).await?;
            let result = data_filling::upload(gateway, part, &template_id).await?;
            eprintln!("File uploaded successfully");
            print_json(&result)
        }
        DataFillCommand::Calculated { batch_id } => {
            print_json(&data_filling::calculated(gateway, &batch_id).await?)
        }
        DataFillCommand::Export { batch_id, out } => {
            let bytes = data_filling::export(gateway, &batch_id).await?;
            let path = out.unwrap_or_else(|| export_name(&batch_id));
            save(&path, &bytes).await
        }
    }
}

/// Refuse to hit the backend without a stored access token.
async fn require_session(gateway: &Gateway) -> Result<()> {
    if gateway.credential_store().access_token().await.is_none() {
        return Err(Error::NotLoggedIn.into());
    }
    Ok(())
}

async fn read_spreadsheet(path: &Path) -> Result<FilePart> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidInput(format!("not a file: {}", path.display())))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(api::spreadsheet(file_name, bytes))
}

async fn save(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn xlsx_name(stem: &str) -> PathBuf {
    PathBuf::from(format!("{stem}.xlsx"))
}

/// Default export name: `employee_data_<first 8 chars of batch id>.xlsx`.
fn export_name(batch_id: &str) -> PathBuf {
    let short: String = batch_id.chars().take(8).collect();
    xlsx_name(&format!("employee_data_{short}"))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
