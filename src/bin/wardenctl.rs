use clap::{Parser, Subcommand};
use warden::grpc::{admin, common};
use warden::grpc::admin::admin_client::AdminClient;

///
/// Operator tooling for the warden admin endpoint.
///
/// This is the trusted direct-access path for the operations that used to be
/// one-off database scripts - emergency unlocks, administrative resets and
/// the test clock. It talks to the loopback admin listener, never the public
/// API.
///
#[derive(Parser)]
#[command(name = "wardenctl", about = "Operator tooling for the warden admin endpoint")]
struct Cli {
    /// The admin endpoint - loopback only in production deployments.
    #[arg(long, default_value = "http://127.0.0.1:50052")]
    endpoint: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the admin endpoint is reachable.
    Ping,

    /// Clear the lockout on a superadmin account. Audited - actor and reason required.
    EmergencyUnlock {
        #[arg(long)]
        email: String,

        /// Your identity, for the audit trail.
        #[arg(long)]
        actor: String,

        #[arg(long)]
        reason: String,
    },

    /// Administrative credential reset.
    SetPassword {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Force a rotation on the next login.
        #[arg(long)]
        require_change: bool,
    },

    /// Require a password change before any further access.
    ForceChange {
        #[arg(long)]
        email: String,
    },

    /// Update the MFA gating flags on an account.
    SetMfa {
        #[arg(long)]
        email: String,

        #[arg(long)]
        required: bool,

        #[arg(long)]
        enabled: bool,
    },

    /// Show the active security policy.
    ActivePolicy,

    /// Fix the service clock to an RFC3339 instant.
    SetTime {
        time: String,
    },

    /// Release the service clock back to real time.
    ResetTime,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut client = AdminClient::connect(cli.endpoint).await?;

    match cli.command {
        Command::Ping => {
            client.ping(common::Empty::default()).await?;
            println!("pong");
        },

        Command::EmergencyUnlock { email, actor, reason } => {
            let response = client
                .emergency_unlock(admin::EmergencyUnlockRequest { email, actor, reason })
                .await?
                .into_inner();

            match response.outcome() {
                admin::UnlockOutcome::Unlocked => println!("unlocked"),
                admin::UnlockOutcome::NoActionNeeded => println!("account was not locked - no action needed"),
            }
        },

        Command::SetPassword { email, password, require_change } => {
            client.set_password(admin::SetPasswordRequest {
                email,
                new_password: password,
                require_change_on_next: require_change,
            }).await?;
            println!("password set");
        },

        Command::ForceChange { email } => {
            client.force_password_change(admin::ForceChangeRequest { email }).await?;
            println!("change required on next access");
        },

        Command::SetMfa { email, required, enabled } => {
            client.set_mfa(admin::SetMfaRequest {
                email,
                mfa_required: required,
                mfa_enabled: enabled,
            }).await?;
            println!("mfa flags updated");
        },

        Command::ActivePolicy => {
            let response = client.get_active_policy(common::Empty::default()).await?.into_inner();
            println!("active policy: {}", response.policy_id);
            println!("{:#?}", response.policy);
        },

        Command::SetTime { time } => {
            client.set_time(admin::NewTime { new_time: time.clone() }).await?;
            println!("clock fixed to {}", time);
        },

        Command::ResetTime => {
            client.reset_time(common::Empty::default()).await?;
            println!("clock released");
        },
    }

    Ok(())
}
