//! # Workforce Shell
//!
//! Operator command line over the persistence layer: it loads the
//! configuration, connects the relational store, runs the process-wide
//! persistence bootstrap and executes one command.
//!
//! ## Example
//! ```no_run
//! use wf_shell::{Command, Shell};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let shell = Shell::builder().build().await?;
//!     shell.execute(Command::Repositories, &mut std::io::stdout()).await
//! }
//! ```

mod cli;

pub use cli::{Cli, Command, EmployeeArgs, EmployeeCommand, PageArgs};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::io::Write;
use tracing::info;
use wf::domain::config::AppConfig;
use wf::features::employee::{Employee, EmployeeService};
use wf::kernel::persistence::Persistence;

/// A fluent builder for the [`Shell`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ShellBuilder {
    cfg: AppConfig,
}

impl ShellBuilder {
    pub fn config(mut self, cfg: AppConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Overrides the relational store URL (e.g. `mem://`).
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.cfg.database.url = url.into();
        self
    }

    /// Connects the relational store, runs the persistence bootstrap and
    /// rebuilds the search indices from the stored records.
    ///
    /// # Errors
    /// * The database is unreachable or rejects the credentials.
    /// * The bootstrap fails (see `wf::kernel::persistence::PersistenceError`),
    ///   including when it already ran in this process.
    pub async fn build(self) -> Result<Shell> {
        let database =
            wf::connect(&self.cfg.database).await.context("Failed to establish database connection")?;
        let persistence =
            wf::init(&self.cfg.persistence, database).context("Persistence bootstrap failed")?;
        wf::reindex(&persistence).await.context("Rebuilding search indices")?;
        let employees = EmployeeService::from_persistence(&persistence)?;

        info!(repositories = persistence.registrations().len(), "Shell ready");
        Ok(Shell { persistence, employees })
    }
}

/// A bootstrapped shell.
#[derive(Debug)]
pub struct Shell {
    persistence: Persistence,
    employees: EmployeeService,
}

impl Shell {
    pub fn builder() -> ShellBuilder {
        ShellBuilder::default()
    }

    #[must_use]
    pub const fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Runs `command`, writing its JSON result to `out`.
    ///
    /// # Errors
    /// Storage, search and output failures.
    pub async fn execute(&self, command: Command, out: &mut impl Write) -> Result<()> {
        match command {
            Command::Repositories => emit(out, self.persistence.registrations()),
            Command::Seed => {
                let created = self.seed().await?;
                emit(out, &created)
            },
            Command::Reindex => {
                let tx = self.persistence.begin_read_only();
                let indexed = self.employees.reindex(&tx).await?;
                emit(out, &json!({ "indexed": indexed }))
            },
            Command::Employee(command) => self.employee(command, out).await,
        }
    }

    /// Inserts the sample employees in one unit of work.
    ///
    /// # Errors
    /// Storage failures; nothing is inserted then.
    pub async fn seed(&self) -> Result<Vec<Employee>> {
        let mut tx = self.persistence.begin();
        let mut created = Vec::new();
        for employee in samples() {
            created.push(self.employees.create(&mut tx, employee).await?);
        }
        tx.commit().await.context("Committing sample employees")?;
        info!(count = created.len(), "Sample employees inserted");
        Ok(created)
    }

    async fn employee(&self, command: EmployeeCommand, out: &mut impl Write) -> Result<()> {
        match command {
            EmployeeCommand::Add(args) => {
                let mut tx = self.persistence.begin();
                let created = self.employees.create(&mut tx, args.into()).await?;
                tx.commit().await?;
                emit(out, &created)
            },
            EmployeeCommand::Get { id } => {
                let tx = self.persistence.begin_read_only();
                let employee = self.employees.find_one(&tx, id).await?;
                emit(out, &employee.with_context(|| format!("Employee {id} not found"))?)
            },
            EmployeeCommand::List(page) => {
                let tx = self.persistence.begin_read_only();
                emit(out, &self.employees.find_all(&tx, &page.pageable()).await?)
            },
            EmployeeCommand::Search { query, page } => {
                emit(out, &self.employees.search(&query, &page.pageable()).await?)
            },
            EmployeeCommand::Delete { id } => {
                let mut tx = self.persistence.begin();
                let deleted = self.employees.delete(&mut tx, id).await?;
                tx.commit().await?;
                emit(out, &json!({ "id": id, "deleted": deleted }))
            },
        }
    }
}

fn emit(out: &mut impl Write, value: &(impl serde::Serialize + ?Sized)) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Sample records of the employee entity.
#[must_use]
pub fn samples() -> Vec<Employee> {
    vec![
        Employee {
            first_name: Some("Henriette".to_owned()),
            last_name: Some("Greenholt".to_owned()),
            email: Some("Ervin.Lehner@hotmail.com".to_owned()),
            phone_number: Some("grey SSL sensor".to_owned()),
            hire_date: Utc.with_ymd_and_hms(2023, 11, 4, 9, 9, 0).single(),
            salary: Some(89015),
            commission_pct: Some(35265),
            slip_no: Some(64922),
            pay_order_number: Some(99788),
            ..Employee::default()
        },
        Employee {
            last_name: Some("Kutch".to_owned()),
            email: Some("Harrison14@hotmail.com".to_owned()),
            hire_date: Utc.with_ymd_and_hms(2023, 11, 4, 19, 29, 0).single(),
            commission_pct: Some(99523),
            slip_no: Some(40560),
            pay_order_number: Some(28480),
            ..Employee::default()
        },
        Employee::default(),
    ]
}
