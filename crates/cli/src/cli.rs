use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "workshop")]
#[command(about = "Sign in to the workshop backend and call its API")]
#[command(version)]
pub struct Cli {
    /// API base URL (overrides API_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Session file (overrides SESSION_FILE)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in with a username and password
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "WORKSHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Continue as a guest
    Guest,

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Whoami,

    /// Check whether the stored session may open a page
    Can {
        /// Page path, e.g. /admin/bookings
        path: String,
    },

    /// Create a customer account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "WORKSHOP_PASSWORD", hide_env_values = true)]
        password: String,

        /// Repeat the password
        #[arg(long)]
        confirm: String,
    },

    /// Email a password recovery link
    ResetPassword {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password from a recovery link
    ConfirmReset {
        #[arg(long)]
        uid: String,

        #[arg(long)]
        token: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        confirm: String,
    },

    /// List your vehicles
    Vehicles,

    /// Choose the vehicle to work with
    SelectVehicle {
        #[arg(long)]
        make: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        year: String,

        #[arg(long)]
        plate: Option<String>,
    },

    /// Start paying for a booking
    PayBooking {
        booking_id: i64,
    },

    /// Confirm a booking payment
    VerifyBooking {
        booking_id: i64,
        payment_intent_id: String,
    },

    /// Authenticated GET
    Get {
        path: String,
    },

    /// Authenticated POST
    Post {
        path: String,

        /// JSON body (e.g. '{"status": "Completed"}')
        #[arg(long)]
        body: Option<String>,
    },

    /// Authenticated PUT
    Put {
        path: String,

        /// JSON body
        #[arg(long)]
        body: Option<String>,
    },

    /// Authenticated PATCH
    Patch {
        path: String,

        /// JSON body (e.g. '{"status": "Completed"}')
        #[arg(long)]
        body: Option<String>,
    },

    /// Authenticated DELETE
    Delete {
        path: String,
    },
}
