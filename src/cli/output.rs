// Output formatting and display for CLI

use crate::events::OverlayEvent;
use crate::process::{StartReply, TrackedInstance};
use crate::state::StatusRecord;
use chrono::{DateTime, Local};
use colored::*;
use std::time::SystemTime;

/// Print the synchronous reply to a start request
pub fn print_start_reply(reply: &StartReply) {
    if reply.already_running {
        println!(
            "{}",
            format!("✓ {} (pid {})", reply.message, reply.pid)
                .green()
                .bold()
        );
    } else {
        println!("{} {}", "✓".green().bold(), reply.message);
        println!("  {}: {}", "PID".bold(), reply.pid);
    }
}

/// Print a lifecycle event as it arrives
pub fn print_event(event: &OverlayEvent) {
    match event {
        OverlayEvent::Started { pid, message, .. } => {
            println!("{}", "✓ Overlay started".green().bold());
            println!("  {}: {}", "PID".bold(), pid);
            println!("  {}", message.dimmed());
        }
        OverlayEvent::Stopped {
            pid,
            exit_error,
            error_msg,
            exit_code,
            ..
        } => {
            if *exit_error {
                println!(
                    "{}",
                    format!("✗ Overlay stopped with error (pid {})", pid)
                        .red()
                        .bold()
                );
                println!("  {}: {}", "Exit code".bold(), exit_code);
                println!("  {}: {}", "Reason".bold(), error_msg);
            } else {
                println!(
                    "{}",
                    format!("✓ Overlay stopped (pid {})", pid).green().bold()
                );
            }
        }
    }
}

/// Print the liveness view: probe result, persisted record, tracked instance
pub fn print_status(running: bool, record: &StatusRecord, instance: Option<&TrackedInstance>) {
    println!("\n{}", "Overlay Status".bold().underline());
    println!();

    if running {
        println!("  {:<15} {}", "Engine:".bold(), "running".green());
    } else {
        println!("  {:<15} {}", "Engine:".bold(), "not running".bright_black());
    }

    println!("  {:<15} {}", "Record:".bold(), record.status);
    println!("  {:<15} {}", "Disabled:".bold(), record.is_disabled);

    if let Some(instance) = instance {
        println!("  {:<15} {}", "PID:".bold(), instance.pid);
        println!(
            "  {:<15} {}",
            "Phase:".bold(),
            format_phase_colored(instance)
        );
        if let Some(started_at) = instance.started_at {
            println!(
                "  {:<15} {}",
                "Started:".bold(),
                format_timestamp(started_at)
            );
        }
    }

    println!();
}

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

fn format_phase_colored(instance: &TrackedInstance) -> String {
    use crate::process::Phase;
    match instance.phase {
        Phase::Running => instance.phase.to_string().green().to_string(),
        Phase::Launching | Phase::AwaitingConfirmation | Phase::Stopping => {
            instance.phase.to_string().yellow().to_string()
        }
        Phase::Idle => instance.phase.to_string().bright_black().to_string(),
        Phase::Failed => instance.phase.to_string().red().bold().to_string(),
    }
}

fn format_timestamp(at: SystemTime) -> String {
    let datetime: DateTime<Local> = at.into();
    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}
