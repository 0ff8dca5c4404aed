//! Token assignment: map residual tokens onto a command's arguments.
//!
//! The planner only decides *what* goes *where*; it never touches argument
//! state. The orchestrator applies the plan through `Argument::assign`, in
//! order.
//!
//! Rules, in the order they apply:
//!
//! 1. `-abc` expands to `-a -b -c` (single dash, alphanumerics only).
//! 2. Everything after `--` is transfer input; `--` itself is dropped.
//! 3. A flag-shaped token assigns `true` to every matching flag and leaves
//!    every matching named argument waiting for the next value. A new
//!    flag-shaped token finalizes waiting named arguments with `null`.
//! 4. Other tokens go to the waiting named arguments, else to the next
//!    unfilled positional, else to overflow.
//! 5. Overflow and transfer tokens are fanned out to every overflow and
//!    transfer argument respectively.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::collections::VecDeque;

use serde_json::Value;

use crate::argument::{Argument, ArgumentKind};
use crate::argv::{TERMINATOR, expand_compound_flags, flag_name, is_flag_shaped};

/// One pending `Argument::assign` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Index into the argument slice the plan was made for
    pub index: usize,
    pub value: Value,
}

/// A flag-shaped token no argument claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    /// The token as seen after compound expansion (`-x`, `--nope`)
    pub token: String,
    /// The token with its dashes stripped
    pub name: String,
}

/// Output of [`plan_assignments`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentPlan {
    pub assignments: Vec<Assignment>,
    pub overflow: Vec<String>,
    pub transfer: Vec<String>,
    pub unknown_names: Vec<UnknownName>,
}

impl AssignmentPlan {
    fn push(&mut self, index: usize, value: Value) {
        self.assignments.push(Assignment { index, value });
    }

    fn finalize_pending(&mut self, pending: &mut Vec<usize>) {
        for index in pending.drain(..) {
            self.push(index, Value::Null);
        }
    }
}

fn indices_of(arguments: &[Argument], kind: ArgumentKind) -> Vec<usize> {
    arguments
        .iter()
        .enumerate()
        .filter(|(_, a)| a.kind() == kind)
        .map(|(i, _)| i)
        .collect()
}

/// Plan how `tokens` bind to `arguments`.
pub fn plan_assignments(arguments: &[Argument], tokens: &[String]) -> AssignmentPlan {
    let named = indices_of(arguments, ArgumentKind::Named);
    let flags = indices_of(arguments, ArgumentKind::Flag);
    let mut positional: VecDeque<usize> = indices_of(arguments, ArgumentKind::Positional).into();

    let mut plan = AssignmentPlan::default();
    let mut pending: Vec<usize> = Vec::new();
    let mut in_transfer = false;

    for token in expand_compound_flags(tokens) {
        if in_transfer {
            plan.transfer.push(token);
            continue;
        }
        if token == TERMINATOR {
            in_transfer = true;
            continue;
        }

        if is_flag_shaped(&token) {
            plan.finalize_pending(&mut pending);

            let name = flag_name(&token);
            let matched_flags: Vec<usize> = flags
                .iter()
                .copied()
                .filter(|&i| arguments[i].matches(name))
                .collect();
            pending = named
                .iter()
                .copied()
                .filter(|&i| arguments[i].matches(name))
                .collect();

            for &index in &matched_flags {
                plan.push(index, Value::Bool(true));
            }
            if matched_flags.is_empty() && pending.is_empty() {
                plan.unknown_names.push(UnknownName {
                    name: name.to_string(),
                    token: token.clone(),
                });
            }
            continue;
        }

        if !pending.is_empty() {
            for index in pending.drain(..) {
                plan.push(index, Value::String(token.clone()));
            }
        } else if let Some(index) = positional.pop_front() {
            plan.push(index, Value::String(token));
        } else {
            plan.overflow.push(token);
        }
    }

    plan.finalize_pending(&mut pending);

    for index in indices_of(arguments, ArgumentKind::Overflow) {
        for token in &plan.overflow.clone() {
            plan.push(index, Value::String(token.clone()));
        }
    }
    for index in indices_of(arguments, ArgumentKind::Transfer) {
        for token in &plan.transfer.clone() {
            plan.push(index, Value::String(token.clone()));
        }
    }

    plan
}
