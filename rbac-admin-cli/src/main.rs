//! RBAC Admin CLI - command-line front end for the admin console
//!
//! Signs in against the admin backend, manages the signed-in user's profile
//! and lets super administrators maintain roles, menus and the per-role
//! rights matrix.

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use rbac_admin_api::{ApiClientConfig, HttpConsoleApi};
use rbac_admin_app::{
    DirectoryCache, FileCredentialStore, FixedAnswer, ForceLoginPrompt, LoadOutcome,
    RightsReconciler, SaveOutcome, SessionManager, SessionStore,
};
use rbac_admin_core::{
    authentication_error, config_error, init_logging, log_operation_error, log_operation_start,
    log_operation_success, not_found_error, validation_error, ConsoleConfig, ConsoleError,
    ConsoleResult, CreateMenuRequest, CreateRoleRequest, ErrorContext, Menu, MenuOrder,
    PermissionField, Role, RoleFilter, Session, UpdateMenuRequest, UpdateProfileRequest,
    UpdateRoleRequest, UserRight,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "rbac-admin")]
#[command(about = "Administrative console for a role-based access control backend")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// End any other active session without asking
        #[arg(long)]
        force: bool,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show or update the signed-in user's profile
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        mobile: Option<String>,

        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        time_zone: Option<String>,
    },

    /// Change the signed-in user's password
    ChangePassword,

    /// Request a password reset link
    ForgotPassword {
        /// Account email
        email: String,
    },

    /// Set a new password with a reset token
    ResetPassword {
        /// Token from the reset link
        token: String,
    },

    /// Manage roles
    Roles {
        #[command(subcommand)]
        action: RoleCommands,
    },

    /// Manage menu entries
    Menus {
        #[command(subcommand)]
        action: MenuCommands,
    },

    /// Inspect and edit a role's rights matrix
    Rights {
        #[command(subcommand)]
        action: RightsCommands,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum RoleCommands {
    /// List roles
    List {
        /// Only active roles
        #[arg(long)]
        active: bool,

        /// Name filter
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one role
    Show { id: String },

    /// Create a role
    Create {
        name: String,

        /// Create the role disabled
        #[arg(long)]
        inactive: bool,
    },

    /// Rename or (de)activate a role
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a role
    Delete { id: String },

    /// Restore a deleted role
    Restore { id: String },
}

#[derive(Subcommand)]
enum MenuCommands {
    /// List menus in display order
    List {
        /// Only menus of this type
        #[arg(long = "type")]
        menu_type: Option<String>,
    },

    /// Show one menu
    Show { id: String },

    /// Create a menu entry
    Create {
        name: String,

        #[arg(long = "type")]
        menu_type: Option<String>,

        /// Sequence number used for ordering
        #[arg(long)]
        seq: Option<f64>,

        #[arg(long)]
        path: Option<String>,

        #[arg(long)]
        map_key: Option<String>,
    },

    /// Update a menu entry
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type")]
        menu_type: Option<String>,

        #[arg(long)]
        seq: Option<f64>,

        #[arg(long)]
        path: Option<String>,

        #[arg(long)]
        map_key: Option<String>,
    },

    /// Delete a menu entry
    Delete { id: String },

    /// Assign new sequence numbers (`<menu-id>=<seq>`)
    Reorder {
        #[arg(required = true)]
        orders: Vec<String>,
    },
}

#[derive(Subcommand)]
enum RightsCommands {
    /// Print the full rights matrix of a role
    Show { role: String },

    /// Toggle permissions (`<menu-id>:<permission>`) and save
    Set {
        role: String,

        #[arg(required = true)]
        changes: Vec<String>,
    },

    /// Ask the server whether a role holds a permission on a menu
    Check {
        role: String,
        menu: String,
        permission: String,
    },
}

/// Components shared by every command
struct Console {
    sessions: SessionManager,
    directory: Arc<DirectoryCache>,
    rights: RightsReconciler,
}

impl Console {
    fn new(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let session_store = SessionStore::new();
        let api = Arc::new(
            HttpConsoleApi::new(ApiClientConfig::from(&config.api))?
                .with_token_provider(Arc::new(session_store.clone())),
        );
        let credentials = Arc::new(FileCredentialStore::new(config.storage.credentials_path()));

        let sessions = SessionManager::new(api.clone(), credentials, session_store);
        let directory = Arc::new(DirectoryCache::new(api.clone(), api.clone()));
        let rights = RightsReconciler::new(
            directory.clone(),
            api,
            config.rights.verify_catalog_on_save,
        );

        Ok(Self {
            sessions,
            directory,
            rights,
        })
    }

    /// Restore the stored session or fail
    async fn signed_in(&self) -> ConsoleResult<Session> {
        self.sessions.restore_session().await.ok_or_else(|| {
            authentication_error!("Not signed in. Run 'rbac-admin login' first", "cli")
        })
    }

    /// Restore the stored session and require super administrator rights
    async fn administrator(&self) -> ConsoleResult<Session> {
        let session = self.signed_in().await?;
        if !session.is_super_admin() {
            return Err(ConsoleError::Authentication {
                message: format!("{} is not a super administrator", session.email()),
                context: ErrorContext::new("cli")
                    .with_operation("require_admin")
                    .with_suggestion("Sign in with an administrator account"),
            });
        }
        Ok(session)
    }
}

/// Asks on the terminal before ending another session
struct TerminalPrompt;

#[async_trait]
impl ForceLoginPrompt for TerminalPrompt {
    async fn confirm_force_login(&self, server_message: &str) -> bool {
        println!("⚠️  {}", server_message);
        match read_line("End the other session and sign in here? [y/N] ").await {
            Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                debug!(error = %e, "Could not read confirmation");
                false
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        e.log();
        eprintln!("❌ {}", e.user_message());
        if let Some(context) = e.context() {
            for suggestion in &context.recovery_suggestions {
                eprintln!("   💡 {}", suggestion);
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> ConsoleResult<()> {
    dotenvy::dotenv().ok();

    let mut config = load_config(cli.config.as_ref()).await?;
    config.apply_env_overrides();

    // Initialize logging with unified system
    let mut logging_config = config.logging.clone();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }
    init_logging(&logging_config).map_err(|e| ConsoleError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the [logging] section of the configuration"),
    })?;

    info!("Starting rbac-admin v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Config {
        show,
        init,
        validate,
    } = cli.command
    {
        return handle_config(show, init, validate, &config).await;
    }

    config.validate()?;
    let console = Console::new(&config)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            force,
        } => handle_login(&console, email, password, force).await,
        Commands::Logout => {
            console.sessions.logout().await;
            println!("👋 Signed out");
            Ok(())
        }
        Commands::Whoami => {
            let session = console.signed_in().await?;
            print_profile(&session);
            Ok(())
        }
        Commands::Profile {
            name,
            mobile,
            language,
            time_zone,
        } => {
            let request = UpdateProfileRequest {
                name,
                mobile_no: mobile,
                preferred_language: language,
                time_zone,
            };
            handle_profile(&console, request).await
        }
        Commands::ChangePassword => handle_change_password(&console).await,
        Commands::ForgotPassword { email } => {
            let message = console.sessions.forgot_password(&email).await?;
            println!("📧 {}", message);
            Ok(())
        }
        Commands::ResetPassword { token } => {
            let new_password = read_line("New password: ").await?;
            let message = console
                .sessions
                .reset_password(&token, &new_password)
                .await?;
            println!("✅ {}", message);
            Ok(())
        }
        Commands::Roles { action } => {
            console.administrator().await?;
            handle_roles(&console, action).await
        }
        Commands::Menus { action } => {
            console.administrator().await?;
            handle_menus(&console, action).await
        }
        Commands::Rights { action } => {
            console.administrator().await?;
            handle_rights(&console, action).await
        }
        Commands::Config { .. } => Ok(()),
    }
}

/// Load configuration from file or use defaults
async fn load_config(config_path: Option<&PathBuf>) -> ConsoleResult<ConsoleConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return ConsoleConfig::from_file(path);
    }

    // Try to load from default locations
    let default_paths = [
        dirs::config_dir().map(|d| d.join("rbac-admin").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".rbac-admin").join("config.toml")),
        Some(PathBuf::from("rbac-admin.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return ConsoleConfig::from_file(path);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(ConsoleConfig::default())
}

async fn handle_config(
    show: bool,
    init: bool,
    validate: bool,
    config: &ConsoleConfig,
) -> ConsoleResult<()> {
    if init {
        let config_dir = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
            .ok_or_else(|| config_error!("Could not determine a configuration directory", "cli"))?
            .join("rbac-admin");

        tokio::fs::create_dir_all(&config_dir).await?;
        let config_path = config_dir.join("config.toml");

        ConsoleConfig::default().save_to_file(&config_path)?;
        println!("✅ Configuration initialized at: {:?}", config_path);
        println!("📝 Edit api.base_url to point at your admin backend.");
    }

    if show {
        let rendered = toml::to_string_pretty(config).map_err(|e| ConsoleError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli").with_operation("show_config"),
        })?;
        println!("📋 Current configuration:");
        println!("{}", rendered);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    if !show && !init && !validate {
        println!("Nothing to do. Use --init, --show or --validate.");
    }

    Ok(())
}

async fn handle_login(
    console: &Console,
    email: String,
    password: Option<String>,
    force: bool,
) -> ConsoleResult<()> {
    log_operation_start!("login", email = %email);

    let password = match password {
        Some(password) => password,
        None => read_line("Password: ").await?,
    };

    let result = if force {
        console
            .sessions
            .login(&email, &password, &FixedAnswer(true))
            .await
    } else {
        console
            .sessions
            .login(&email, &password, &TerminalPrompt)
            .await
    };

    let session = result.map_err(|e| {
        log_operation_error!("login", e, email = %email);
        e
    })?;

    log_operation_success!("login", user_id = %session.user_id());
    println!("✅ Signed in as {} <{}>", session.display_name(), session.email());
    Ok(())
}

async fn handle_profile(console: &Console, request: UpdateProfileRequest) -> ConsoleResult<()> {
    console.signed_in().await?;

    let session = if request.is_empty() {
        console.sessions.refresh_profile().await?
    } else {
        let session = console.sessions.update_profile(&request).await?;
        println!("✅ Profile updated");
        session
    };

    print_profile(&session);
    Ok(())
}

async fn handle_change_password(console: &Console) -> ConsoleResult<()> {
    console.signed_in().await?;

    let current = read_line("Current password: ").await?;
    let new_password = read_line("New password: ").await?;
    let confirmation = read_line("Repeat new password: ").await?;
    if new_password != confirmation {
        return Err(validation_error!(
            "Passwords do not match",
            "newPassword",
            "cli"
        ));
    }

    let message = console
        .sessions
        .change_password(&current, &new_password)
        .await?;
    println!("✅ {}", message);
    Ok(())
}

async fn handle_roles(console: &Console, action: RoleCommands) -> ConsoleResult<()> {
    let directory = &console.directory;

    match action {
        RoleCommands::List { active, search } => {
            let filter = RoleFilter {
                is_active: active.then_some(true),
                search,
            };
            let roles = directory.list_roles(&filter).await?;
            if roles.is_empty() {
                println!("No roles found");
            }
            for role in &roles {
                print_role(role);
            }
        }
        RoleCommands::Show { id } => {
            print_role(&directory.get_role(&id).await?);
        }
        RoleCommands::Create { name, inactive } => {
            let role = directory
                .create_role(&CreateRoleRequest {
                    name,
                    is_active: Some(!inactive),
                })
                .await?;
            println!("✅ Created role");
            print_role(&role);
        }
        RoleCommands::Update { id, name, active } => {
            let role = directory
                .update_role(
                    &id,
                    &UpdateRoleRequest {
                        name,
                        is_active: active,
                    },
                )
                .await?;
            println!("✅ Updated role");
            print_role(&role);
        }
        RoleCommands::Delete { id } => {
            println!("🗑️  {}", directory.delete_role(&id).await?);
        }
        RoleCommands::Restore { id } => {
            let role = directory.restore_role(&id).await?;
            println!("♻️  Restored role");
            print_role(&role);
        }
    }

    Ok(())
}

async fn handle_menus(console: &Console, action: MenuCommands) -> ConsoleResult<()> {
    let directory = &console.directory;

    match action {
        MenuCommands::List { menu_type } => {
            let menus = match menu_type {
                Some(menu_type) => directory.list_menus_by_type(&menu_type).await?,
                None => directory.list_menus().await?,
            };
            if menus.is_empty() {
                println!("No menus found");
            }
            for menu in &menus {
                print_menu(menu);
            }
        }
        MenuCommands::Show { id } => {
            print_menu(&directory.get_menu(&id).await?);
        }
        MenuCommands::Create {
            name,
            menu_type,
            seq,
            path,
            map_key,
        } => {
            let menu = directory
                .create_menu(&CreateMenuRequest {
                    name,
                    menu_type,
                    sequence_number: seq,
                    path,
                    map_key,
                })
                .await?;
            println!("✅ Created menu");
            print_menu(&menu);
        }
        MenuCommands::Update {
            id,
            name,
            menu_type,
            seq,
            path,
            map_key,
        } => {
            let menu = directory
                .update_menu(
                    &id,
                    &UpdateMenuRequest {
                        name,
                        menu_type,
                        sequence_number: seq,
                        path,
                        map_key,
                    },
                )
                .await?;
            println!("✅ Updated menu");
            print_menu(&menu);
        }
        MenuCommands::Delete { id } => {
            println!("🗑️  {}", directory.delete_menu(&id).await?);
        }
        MenuCommands::Reorder { orders } => {
            let orders = orders
                .iter()
                .map(|order| parse_menu_order(order))
                .collect::<ConsoleResult<Vec<_>>>()?;
            println!("✅ {}", directory.reorder_menus(&orders).await?);
        }
    }

    Ok(())
}

async fn handle_rights(console: &Console, action: RightsCommands) -> ConsoleResult<()> {
    let rights = &console.rights;

    match action {
        RightsCommands::Show { role } => {
            let matrix = load_matrix(rights, &role).await?;
            print_matrix(&matrix);
        }
        RightsCommands::Set { role, changes } => {
            let changes = changes
                .iter()
                .map(|change| parse_change(change))
                .collect::<ConsoleResult<Vec<_>>>()?;

            log_operation_start!("set_rights", role_id = %role, changes = changes.len());
            load_matrix(rights, &role).await?;

            for (menu_id, field) in &changes {
                if !rights.toggle(menu_id, *field).await? {
                    return Err(not_found_error!(format!("Menu {}", menu_id), "cli"));
                }
            }

            let mut outcome = rights.save().await?;
            if outcome == SaveOutcome::CatalogChanged {
                println!("⚠️  The menu catalog changed while editing; edits were re-applied to the current menus");
                outcome = rights.save().await?;
            }

            match outcome {
                SaveOutcome::Saved(message) => {
                    log_operation_success!("set_rights", role_id = %role);
                    println!("✅ {}", message);
                    if let Some(matrix) = rights.matrix().await {
                        print_matrix(&matrix);
                    }
                }
                SaveOutcome::CatalogChanged => {
                    return Err(ConsoleError::Server {
                        message: "The menu catalog keeps changing; try again".to_string(),
                        status: None,
                        context: ErrorContext::new("cli").with_operation("set_rights"),
                    });
                }
            }
        }
        RightsCommands::Check {
            role,
            menu,
            permission,
        } => {
            let field = parse_permission(&permission)?;
            let allowed = rights.check_permission(&role, &menu, field).await?;
            if allowed {
                println!("✅ {} may {} on {}", role, field, menu);
            } else {
                println!("🚫 {} may not {} on {}", role, field, menu);
            }
        }
    }

    Ok(())
}

async fn load_matrix(rights: &RightsReconciler, role_id: &str) -> ConsoleResult<Vec<UserRight>> {
    match rights.load_matrix(role_id).await? {
        LoadOutcome::Loaded(matrix) => Ok(matrix),
        LoadOutcome::Superseded => Err(ConsoleError::MatrixNotReady {
            message: "Another role was selected while loading".to_string(),
            context: ErrorContext::new("cli").with_operation("load_matrix"),
        }),
    }
}

fn parse_permission(value: &str) -> ConsoleResult<PermissionField> {
    value
        .parse()
        .map_err(|message: String| validation_error!(message, "permission", "cli"))
}

/// `<menu-id>:<permission>`
fn parse_change(value: &str) -> ConsoleResult<(String, PermissionField)> {
    let (menu_id, permission) = value.rsplit_once(':').ok_or_else(|| {
        validation_error!(
            format!("Invalid change '{}'. Use <menu-id>:<permission>", value),
            "changes",
            "cli"
        )
    })?;
    Ok((menu_id.to_string(), parse_permission(permission)?))
}

/// `<menu-id>=<sequence>`
fn parse_menu_order(value: &str) -> ConsoleResult<MenuOrder> {
    let invalid = || {
        validation_error!(
            format!("Invalid order '{}'. Use <menu-id>=<sequence>", value),
            "orders",
            "cli"
        )
    };
    let (menu_id, seq) = value.split_once('=').ok_or_else(invalid)?;
    let sequence_number = seq.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok(MenuOrder {
        menu_id: menu_id.trim().to_string(),
        sequence_number,
    })
}

/// Read one line from stdin after printing `prompt`
async fn read_line(prompt: &str) -> ConsoleResult<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .map_err(|e| ConsoleError::Io(std::io::Error::other(e)))??;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_profile(session: &Session) {
    let user = &session.user;
    println!("👤 {} <{}>", user.name, user.email);
    println!("   id:          {}", user.user_id);
    if let Some(role_id) = &user.role_id {
        println!("   role:        {}", role_id);
    }
    if let Some(mobile) = &user.mobile_no {
        println!("   mobile:      {}", mobile);
    }
    if let Some(language) = &user.preferred_language {
        println!("   language:    {}", language);
    }
    if let Some(time_zone) = &user.time_zone {
        println!("   time zone:   {}", time_zone);
    }
    println!("   super admin: {}", if user.is_super_admin { "yes" } else { "no" });
    println!("   active:      {}", if user.is_active { "yes" } else { "no" });
}

fn print_role(role: &Role) {
    let status = if role.is_active { "active" } else { "inactive" };
    println!("{:<38} {:<30} {}", role.id, role.name, status);
}

fn print_menu(menu: &Menu) {
    let seq = menu
        .sequence_number
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<38} {:>6}  {:<24} {:<10} {}",
        menu.id,
        seq,
        menu.name,
        menu.menu_type.as_deref().unwrap_or("-"),
        menu.path.as_deref().unwrap_or("")
    );
}

fn print_matrix(matrix: &[UserRight]) {
    print!("{:<38} {:<24}", "menu", "name");
    for field in PermissionField::ALL {
        print!(" {:>6}", field.as_str());
    }
    println!();

    for row in matrix {
        let name = row.menu.as_ref().map(|m| m.name.as_str()).unwrap_or("");
        print!("{:<38} {:<24}", row.menu_id, name);
        for field in PermissionField::ALL {
            print!(" {:>6}", if row.get(field) { "✓" } else { "·" });
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_change() {
        let (menu, field) = parse_change("m-1:export").unwrap();
        assert_eq!(menu, "m-1");
        assert_eq!(field, PermissionField::Export);

        assert!(parse_change("m-1").is_err());
        assert!(parse_change("m-1:approve").is_err());
    }

    #[test]
    fn test_parse_menu_order() {
        let order = parse_menu_order("m-7 = 2.5").unwrap();
        assert_eq!(order.menu_id, "m-7");
        assert_eq!(order.sequence_number, 2.5);

        assert!(parse_menu_order("m-7").is_err());
        assert!(parse_menu_order("m-7=first").is_err());
    }

    #[test]
    fn test_cli_parses_nested_commands() {
        let cli = Cli::try_parse_from(["rbac-admin", "rights", "set", "r-1", "m-1:view", "m-2:edit"])
            .unwrap();
        match cli.command {
            Commands::Rights {
                action: RightsCommands::Set { role, changes },
            } => {
                assert_eq!(role, "r-1");
                assert_eq!(changes.len(), 2);
            }
            _ => panic!("unexpected command"),
        }

        let cli = Cli::try_parse_from(["rbac-admin", "menus", "list", "--type", "main"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Menus {
                action: MenuCommands::List { menu_type: Some(_) }
            }
        ));
    }
}
