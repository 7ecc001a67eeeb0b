//! HR application traffic against the MySQL "employees" sample database.
use super::QueryTemplate;
use crate::sampler::Sampler;
use querypilot_core::{ActiveRecord, Query};

pub(super) const TEMPLATES: &[QueryTemplate] = &[
    QueryTemplate::new("Auth: Login", user_login),
    QueryTemplate::new("Auth: Validate Active", session_validation),
    QueryTemplate::new("Widget: Birthdays", team_birthdays),
    QueryTemplate::new("Widget: New Hires", new_hires),
    QueryTemplate::new("Widget: My Manager", my_dept_manager),
    QueryTemplate::new("Profile: Header", profile_header),
    QueryTemplate::new("Profile: Current Job", profile_current_job),
    QueryTemplate::new("Profile: Current Pay", profile_compensation),
    QueryTemplate::new("Profile: Title Hist", title_history),
    QueryTemplate::new("Profile: Dept Hist", dept_history),
    QueryTemplate::new("Payroll: Dept Batch", payroll_batch),
    QueryTemplate::new("Payroll: View Slip", pay_slip),
    QueryTemplate::new("Payroll: Stale Pay", stale_pay),
    QueryTemplate::new("Payroll: High Earners", high_earners),
    QueryTemplate::new("Payroll: Equity Check", salary_equity),
    QueryTemplate::new("Search: Autocomplete", autocomplete_last_name),
    QueryTemplate::new("Search: Exact Name", exact_last_name),
    QueryTemplate::new("Search: Peer List", find_peers),
    QueryTemplate::new("Talent: Onboarding", onboarding_list),
    QueryTemplate::new("Talent: Veterans", veteran_awards),
    QueryTemplate::new("Org: Direct Reports", direct_reports),
    QueryTemplate::new("Org: All Managers", all_managers),
    QueryTemplate::new("Org: Headcount", headcount),
    QueryTemplate::new("Org: Title Roster", title_roster),
    QueryTemplate::new("D&I: Gender Sample", gender_sample),
    QueryTemplate::new("D&I: Flight Risk", flight_risk),
    QueryTemplate::new("Admin: Raw Dump", raw_dump),
    QueryTemplate::new("Admin: Integrity", orphan_check),
    QueryTemplate::new("Admin: Export CSV", export_roster),
    QueryTemplate::new("Sys: Heartbeat", heartbeat),
];

// Auth

fn user_login(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new(
        "SELECT emp_no, first_name, last_name, gender, hire_date FROM employees WHERE emp_no = ?",
    )
    .bind(s.employee_id())
}

fn session_validation(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT de.dept_no FROM dept_emp de WHERE de.emp_no = ? AND {}",
        active.predicate("de.to_date")
    ))
    .bind(s.employee_id())
    .bind_active(active)
}

// Dashboard widgets

fn team_birthdays(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new("SELECT first_name, birth_date FROM employees WHERE MONTH(birth_date) = ? LIMIT 5")
        .bind(s.month())
}

fn new_hires(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    let range = s.year_range();
    Query::new(
        "SELECT first_name, last_name, hire_date FROM employees
         WHERE hire_date BETWEEN ? AND ? ORDER BY hire_date DESC LIMIT 5",
    )
    .bind(range.start)
    .bind(range.end)
}

fn my_dept_manager(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT e.first_name, e.last_name
         FROM dept_manager dm
         JOIN employees e ON dm.emp_no = e.emp_no
         WHERE dm.dept_no = ? AND {}",
        active.predicate("dm.to_date")
    ))
    .bind(s.department())
    .bind_active(active)
}

// Employee profile

fn profile_header(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new("SELECT first_name, last_name, birth_date, gender FROM employees WHERE emp_no = ?")
        .bind(s.employee_id())
}

fn profile_current_job(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT t.title, d.dept_name
         FROM titles t
         JOIN dept_emp de ON t.emp_no = de.emp_no
         JOIN departments d ON de.dept_no = d.dept_no
         WHERE t.emp_no = ? AND {} AND {}",
        active.predicate("t.to_date"),
        active.predicate("de.to_date"),
    ))
    .bind(s.employee_id())
    .bind_active(active)
    .bind_active(active)
}

fn profile_compensation(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT salary, from_date FROM salaries WHERE emp_no = ? AND {}",
        active.predicate("to_date")
    ))
    .bind(s.employee_id())
    .bind_active(active)
}

fn title_history(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new(
        "SELECT title, from_date, to_date FROM titles WHERE emp_no = ? ORDER BY from_date DESC",
    )
    .bind(s.employee_id())
}

fn dept_history(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new(
        "SELECT d.dept_name, de.from_date, de.to_date
         FROM dept_emp de
         JOIN departments d ON de.dept_no = d.dept_no
         WHERE de.emp_no = ? ORDER BY de.from_date DESC",
    )
    .bind(s.employee_id())
}

// Payroll

fn payroll_batch(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT s.emp_no, s.salary
         FROM salaries s
         JOIN dept_emp de ON s.emp_no = de.emp_no
         WHERE de.dept_no = ? AND {} AND {}
         LIMIT 50",
        active.predicate("s.to_date"),
        active.predicate("de.to_date"),
    ))
    .bind(s.department())
    .bind_active(active)
    .bind_active(active)
}

fn pay_slip(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new("SELECT salary, from_date, to_date FROM salaries WHERE emp_no = ? LIMIT 1")
        .bind(s.employee_id())
}

fn stale_pay(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT emp_no, salary, from_date FROM salaries WHERE {} AND from_date < ? LIMIT 10",
        active.predicate("to_date")
    ))
    .bind_active(active)
    .bind(s.year_range().start)
}

fn high_earners(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT emp_no, salary FROM salaries WHERE salary > ? AND {}
         ORDER BY salary DESC LIMIT 10",
        active.predicate("to_date")
    ))
    .bind(s.salary())
    .bind_active(active)
}

fn salary_equity(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT s.salary
         FROM salaries s
         JOIN titles t ON s.emp_no = t.emp_no
         WHERE t.title = ? AND {} AND {}
         LIMIT 20",
        active.predicate("s.to_date"),
        active.predicate("t.to_date"),
    ))
    .bind(s.title())
    .bind_active(active)
    .bind_active(active)
}

// Search

fn autocomplete_last_name(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new("SELECT emp_no, first_name, last_name FROM employees WHERE last_name LIKE ? LIMIT 8")
        .bind(s.last_name_prefix())
}

fn exact_last_name(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new(
        "SELECT emp_no, first_name, last_name, hire_date FROM employees WHERE last_name = ? LIMIT 20",
    )
    .bind(s.last_name())
}

fn find_peers(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT e.first_name, e.last_name, t.title
         FROM dept_emp de
         JOIN employees e ON de.emp_no = e.emp_no
         JOIN titles t ON e.emp_no = t.emp_no
         WHERE de.dept_no = ? AND {} AND {}
         LIMIT 10",
        active.predicate("de.to_date"),
        active.predicate("t.to_date"),
    ))
    .bind(s.department())
    .bind_active(active)
    .bind_active(active)
}

// Talent

fn onboarding_list(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new("SELECT emp_no, first_name, hire_date FROM employees WHERE hire_date >= ? LIMIT 10")
        .bind(s.year_range().start)
}

fn veteran_awards(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    let cutoff = format!("{:04}-01-01", s.year() - 9);
    Query::new(format!(
        "SELECT e.emp_no, e.first_name, e.hire_date
         FROM employees e
         JOIN dept_emp de ON e.emp_no = de.emp_no
         WHERE e.hire_date < ? AND {}
         LIMIT 10",
        active.predicate("de.to_date")
    ))
    .bind(cutoff)
    .bind_active(active)
}

// Org chart

fn direct_reports(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT e.first_name, e.last_name, t.title
         FROM dept_emp de
         JOIN employees e ON de.emp_no = e.emp_no
         JOIN titles t ON de.emp_no = t.emp_no
         WHERE de.dept_no = ? AND {} AND {}
         LIMIT 15",
        active.predicate("de.to_date"),
        active.predicate("t.to_date"),
    ))
    .bind(s.department())
    .bind_active(active)
    .bind_active(active)
}

fn all_managers(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT d.dept_name, e.first_name, e.last_name
         FROM dept_manager dm
         JOIN departments d ON dm.dept_no = d.dept_no
         JOIN employees e ON dm.emp_no = e.emp_no
         WHERE {} AND dm.from_date <= ?",
        active.predicate("dm.to_date")
    ))
    .bind_active(active)
    .bind(s.year_range().end)
}

fn headcount(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT emp_no FROM dept_emp WHERE dept_no = ? AND {} LIMIT 100",
        active.predicate("to_date")
    ))
    .bind(s.department())
    .bind_active(active)
}

fn title_roster(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT e.first_name, e.last_name
         FROM titles t
         JOIN employees e ON t.emp_no = e.emp_no
         WHERE t.title = ? AND {}
         LIMIT 10",
        active.predicate("t.to_date")
    ))
    .bind(s.title())
    .bind_active(active)
}

// Diversity & inclusion reporting

fn gender_sample(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT e.gender, e.emp_no
         FROM dept_emp de
         JOIN employees e ON de.emp_no = e.emp_no
         WHERE de.dept_no = ? AND {}
         LIMIT 50",
        active.predicate("de.to_date")
    ))
    .bind(s.department())
    .bind_active(active)
}

fn flight_risk(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT emp_no, title, from_date
         FROM titles
         WHERE from_date < ? AND {}
         LIMIT 10",
        active.predicate("to_date")
    ))
    .bind(s.year_range().start)
    .bind_active(active)
}

// Admin

fn raw_dump(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new("SELECT * FROM employees WHERE emp_no = ?").bind(s.employee_id())
}

fn orphan_check(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new(
        "SELECT emp_no FROM employees
         WHERE emp_no >= ? AND emp_no NOT IN (SELECT emp_no FROM dept_emp)
         LIMIT 10",
    )
    .bind(s.employee_id())
}

fn export_roster(s: &mut Sampler<'_>, active: &ActiveRecord) -> Query {
    Query::new(format!(
        "SELECT e.emp_no, e.first_name, e.last_name, t.title, s.salary
         FROM employees e
         JOIN dept_emp de ON e.emp_no = de.emp_no
         JOIN titles t ON e.emp_no = t.emp_no
         JOIN salaries s ON e.emp_no = s.emp_no
         WHERE de.dept_no = ? AND {} AND {} AND {}
         LIMIT 25",
        active.predicate("de.to_date"),
        active.predicate("t.to_date"),
        active.predicate("s.to_date"),
    ))
    .bind(s.department())
    .bind_active(active)
    .bind_active(active)
    .bind_active(active)
}

// System

/// Round trip with a per-request nonce so no cache can answer it.
fn heartbeat(s: &mut Sampler<'_>, _: &ActiveRecord) -> Query {
    Query::new("SELECT ? AS heartbeat").bind(s.employee_id())
}
