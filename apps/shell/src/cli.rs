use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use wf::domain::paging::{DEFAULT_PAGE_SIZE, Pageable, Sort};
use wf::features::employee::Employee;

/// Operator shell over the workforce persistence layer.
#[derive(Debug, Parser)]
#[command(name = "workforce", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to `./workforce.*` if present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Actor recorded in the audit fields of every write.
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Insert the sample employees before running the command.
    #[arg(long, global = true)]
    pub seed: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the registered repositories.
    Repositories,
    /// Employee operations.
    #[command(subcommand)]
    Employee(EmployeeCommand),
    /// Insert the sample employees.
    Seed,
    /// Rebuild the employee search index from the relational store.
    Reindex,
}

#[derive(Debug, Subcommand)]
pub enum EmployeeCommand {
    /// Create an employee.
    Add(EmployeeArgs),
    /// Show one employee.
    Get { id: i64 },
    /// Page through employees.
    List(PageArgs),
    /// Full-text search, e.g. `lastName:greenholt` or `+salary:89015 -email:hotmail`.
    Search {
        query: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Delete an employee.
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct EmployeeArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone_number: Option<String>,
    /// RFC 3339 instant, e.g. `2023-11-04T09:09:00Z`.
    #[arg(long)]
    pub hire_date: Option<DateTime<Utc>>,
    #[arg(long)]
    pub salary: Option<i64>,
    #[arg(long)]
    pub commission_pct: Option<i64>,
    #[arg(long)]
    pub slip_no: Option<i64>,
    #[arg(long)]
    pub pay_order_number: Option<i64>,
}

impl From<EmployeeArgs> for Employee {
    fn from(args: EmployeeArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone_number: args.phone_number,
            hire_date: args.hire_date,
            salary: args.salary,
            commission_pct: args.commission_pct,
            slip_no: args.slip_no,
            pay_order_number: args.pay_order_number,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub size: u32,
    /// `property[,asc|desc]`; repeatable.
    #[arg(long, value_parser = parse_sort)]
    pub sort: Vec<Sort>,
}

impl PageArgs {
    #[must_use]
    pub fn pageable(&self) -> Pageable {
        Pageable::new(self.page, self.size).with_sorts(self.sort.iter().cloned())
    }
}

fn parse_sort(raw: &str) -> Result<Sort, String> {
    Sort::parse(raw).ok_or_else(|| format!("expected `property[,asc|desc]`, got `{raw}`"))
}
