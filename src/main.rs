use alugux::errors::AppError;
use alugux::forms::{ContractFile, PasswordForm, ProfileForm, PropertyForm, RentalForm};
use alugux::notify::Level;
use alugux::remote::memory::{DEMO_EMAIL, DEMO_PASSWORD};
use alugux::routes::Route;
use alugux::session::Credentials;
use alugux::views::AuthView;
use alugux::{AppConfig, AppContext, Shell};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "alugux", version, about = "Gestão de propriedades e aluguéis")]
struct Cli {
    /// Use an in-process backend seeded with sample data
    #[arg(long, global = true)]
    offline: bool,

    #[arg(long, env = "ALUGUX_EMAIL", global = true)]
    email: Option<String>,

    #[arg(long, env = "ALUGUX_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Monthly figures
    Dashboard {
        /// Month as YYYY-MM, defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
    Properties {
        #[command(subcommand)]
        action: PropertyAction,
    },
    Rentals {
        #[command(subcommand)]
        action: RentalAction,
    },
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Change the account password
    Password {
        new_password: String,
        #[arg(long)]
        confirm: String,
    },
    SignUp {
        #[arg(long)]
        full_name: String,
    },
    ResetPassword,
}

#[derive(Subcommand)]
enum PropertyAction {
    List,
    Add {
        title: String,
        address: String,
        price: String,
    },
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        price: Option<String>,
    },
}

#[derive(Subcommand)]
enum RentalAction {
    List,
    /// Properties that can still be rented
    Available,
    Add {
        property_id: String,
        tenant_name: String,
        tenant_cpf: String,
        start_date: String,
        end_date: String,
        monthly_price: String,
        #[arg(long)]
        contract: Option<PathBuf>,
    },
    Edit {
        id: Uuid,
        #[arg(long)]
        tenant_name: Option<String>,
        #[arg(long)]
        tenant_cpf: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        monthly_price: Option<String>,
    },
    Deactivate {
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Update { full_name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🏠 Alugux");

    let ctx = if cli.offline {
        info!("Running against the offline sample backend");
        Arc::new(AppContext::offline(config).await)
    } else {
        Arc::new(AppContext::connect(config)?)
    };
    let mut shell = Shell::new(ctx.clone());

    let result = run(&cli, &mut shell).await;

    for notification in ctx.notifier().drain() {
        match notification.level {
            Level::Success => println!("✅ {}", notification.message),
            Level::Error => eprintln!("❌ {}", notification.message),
        }
    }

    if let Err(err) = result {
        shell.handle_error(&err).await;
        if let AppError::Validation(errors) = &err {
            for (field, message) in errors.iter() {
                eprintln!("   {field}: {message}");
            }
        }
        bail!(err);
    }
    Ok(())
}

fn credentials(cli: &Cli) -> anyhow::Result<Credentials> {
    match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => Ok(Credentials::new(email, password)),
        _ if cli.offline => Ok(Credentials::new(DEMO_EMAIL, DEMO_PASSWORD)),
        _ => bail!("--email and --password (or ALUGUX_EMAIL / ALUGUX_PASSWORD) are required"),
    }
}

async fn contract_file(path: &Path) -> anyhow::Result<ContractFile> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ContractFile {
        name,
        size: metadata.len(),
    })
}

async fn run(cli: &Cli, shell: &mut Shell) -> Result<(), AppError> {
    match &cli.command {
        Command::SignUp { full_name } => {
            let creds = credentials(cli).map_err(config_error)?;
            let auth = AuthView::new(shell.context().clone());
            return auth.sign_up(&creds, full_name).await;
        }
        Command::ResetPassword => {
            let email = cli
                .email
                .clone()
                .ok_or_else(|| config_error(anyhow::anyhow!("--email is required")))?;
            let auth = AuthView::new(shell.context().clone());
            return auth.request_password_reset(&email).await;
        }
        _ => {}
    }

    let creds = credentials(cli).map_err(config_error)?;
    shell.sign_in(&creds).await?;

    match &cli.command {
        Command::Dashboard { month } => {
            shell.navigate(Route::Dashboard.path()).await;
            let view = shell.dashboard().ok_or(AppError::SessionMissing)?;
            if let Some(month) = month {
                view.select_month(month)?;
            }
            let stats = view.stats().await?;
            println!("📅 {}", stats.month);
            println!("   Total a Receber:       {}", stats.revenue_display);
            println!("   Total de Propriedades: {}", stats.property_count);
            println!("   Aluguéis Ativos:       {}", stats.active_rentals);
            println!("   Inquilinos:            {}", stats.tenant_count);
        }
        Command::Properties { action } => {
            shell.navigate(Route::Properties.path()).await;
            let view = shell.properties().ok_or(AppError::SessionMissing)?;
            match action {
                PropertyAction::List => {
                    for (i, property) in view.list().await?.iter().enumerate() {
                        println!("{}. {} ({})", i + 1, property.title, property.price);
                        println!("   {}", property.address);
                        println!("   Status: {}", property.status);
                        println!("   ID: {}", property.id);
                        println!();
                    }
                }
                PropertyAction::Add { title, address, price } => {
                    view.open_create();
                    let saved = view.submit(&PropertyForm::new(title, address, price)).await?;
                    println!("{} {} {}", saved.id, saved.title, saved.price);
                }
                PropertyAction::Edit { id, title, address, price } => {
                    let mut form = view.open_edit(*id).await?;
                    if let Some(title) = title {
                        form.title = title.clone();
                    }
                    if let Some(address) = address {
                        form.address = address.clone();
                    }
                    if let Some(price) = price {
                        form.price = price.clone();
                    }
                    let saved = view.submit(&form).await?;
                    println!("{} {} {}", saved.id, saved.title, saved.price);
                }
            }
        }
        Command::Rentals { action } => {
            shell.navigate(Route::Rentals.path()).await;
            let view = shell.rentals().ok_or(AppError::SessionMissing)?;
            match action {
                RentalAction::List => {
                    for (i, rental) in view.list().await?.iter().enumerate() {
                        println!("{}. {} · {}", i + 1, rental.property_title, rental.tenant_name);
                        println!("   CPF: {}", rental.tenant_cpf);
                        println!("   {} → {}", rental.start_date, rental.end_date);
                        println!("   {} / mês · {}", rental.monthly_price, rental.status);
                        println!("   ID: {}", rental.id);
                        println!();
                    }
                }
                RentalAction::Available => {
                    for property in view.available_properties().await? {
                        println!("{}  {}", property.id, property.title);
                    }
                }
                RentalAction::Add {
                    property_id,
                    tenant_name,
                    tenant_cpf,
                    start_date,
                    end_date,
                    monthly_price,
                    contract,
                } => {
                    let attachment = match contract {
                        Some(path) => Some(contract_file(path).await.map_err(config_error)?),
                        None => None,
                    };
                    let mut form = view.open_create();
                    form.property_id = property_id.clone();
                    form.tenant_name = tenant_name.clone();
                    form.tenant_cpf = tenant_cpf.clone();
                    form.start_date = start_date.clone();
                    form.end_date = end_date.clone();
                    form.monthly_price = monthly_price.clone();
                    form.contract_file = attachment;
                    let saved = view.submit(&form).await?;
                    println!("{} {} {}", saved.id, saved.tenant_name, saved.monthly_price);
                }
                RentalAction::Edit {
                    id,
                    tenant_name,
                    tenant_cpf,
                    start_date,
                    end_date,
                    monthly_price,
                } => {
                    let mut form: RentalForm = view.open_edit(*id).await?;
                    let overrides = [
                        (&mut form.tenant_name, tenant_name),
                        (&mut form.tenant_cpf, tenant_cpf),
                        (&mut form.start_date, start_date),
                        (&mut form.end_date, end_date),
                        (&mut form.monthly_price, monthly_price),
                    ];
                    for (field, value) in overrides {
                        if let Some(value) = value {
                            *field = value.clone();
                        }
                    }
                    let saved = view.submit(&form).await?;
                    println!("{} {} {}", saved.id, saved.tenant_name, saved.monthly_price);
                }
                RentalAction::Deactivate { id } => {
                    let saved = view.deactivate(*id).await?;
                    println!("{} {}", saved.id, saved.status);
                }
            }
        }
        Command::Profile { action } => {
            shell.navigate(Route::Settings.path()).await;
            let view = shell.settings().ok_or(AppError::SessionMissing)?;
            match action {
                ProfileAction::Show => {
                    let profile = view.profile().await?;
                    println!("{} {}", profile.id, profile.full_name);
                }
                ProfileAction::Update { full_name } => {
                    let form = ProfileForm { full_name: full_name.clone() };
                    let profile = view.update_profile(&form).await?;
                    println!("{} {}", profile.id, profile.full_name);
                }
            }
        }
        Command::Password { new_password, confirm } => {
            shell.navigate(Route::Settings.path()).await;
            let view = shell.settings().ok_or(AppError::SessionMissing)?;
            let form = PasswordForm {
                password: new_password.clone(),
                confirm_password: confirm.clone(),
            };
            view.change_password(&form).await?;
        }
        Command::SignUp { .. } | Command::ResetPassword => {}
    }

    Ok(())
}

fn config_error(err: anyhow::Error) -> AppError {
    AppError::Configuration {
        message: err.to_string(),
    }
}
