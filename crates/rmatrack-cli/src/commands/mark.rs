use anyhow::{bail, Result};

use rmatrack_core::model::RecordIdentity;
use rmatrack_core::store::RecordStore;
use rmatrack_core::update::{mark_estimate_sent, mark_reminder_done, mark_shipped};

use super::now;

#[derive(clap::Subcommand, Debug)]
pub enum MarkCommands {
    /// Mark a unit shipped as of right now.
    Shipped {
        #[arg(long)]
        rma: String,
        #[arg(long)]
        serial: String,
    },
    /// Record that an estimate went out to a recipient.
    Sent {
        #[arg(long)]
        rma: String,
        #[arg(long)]
        serial: String,
        #[arg(long)]
        email: String,
    },
    /// Record a completed customer reminder.
    Reminder {
        #[arg(long)]
        rma: String,
        #[arg(long)]
        serial: String,
        #[arg(long)]
        contact_method: String,
    },
}

pub async fn handle_mark_command(command: MarkCommands, store: &dyn RecordStore) -> Result<()> {
    let at = now();
    match command {
        MarkCommands::Shipped { rma, serial } => {
            let identity = RecordIdentity::new(&rma, &serial);
            if !mark_shipped(store, &identity, at).await? {
                bail!("no record matches {identity}");
            }
            println!("Marked {identity} shipped at {at}.");
        }
        MarkCommands::Sent { rma, serial, email } => {
            let identity = RecordIdentity::new(&rma, &serial);
            if !mark_estimate_sent(store, &identity, &email, at).await? {
                bail!("no record matches {identity}");
            }
            println!("Marked estimate for {identity} sent to {email}.");
        }
        MarkCommands::Reminder {
            rma,
            serial,
            contact_method,
        } => {
            let identity = RecordIdentity::new(&rma, &serial);
            if !mark_reminder_done(store, &identity, &contact_method, at).await? {
                bail!("no record matches {identity}");
            }
            println!("Recorded reminder for {identity} via {contact_method}.");
        }
    }
    Ok(())
}
