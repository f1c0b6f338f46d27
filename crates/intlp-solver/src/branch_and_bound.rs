//! Branch-and-bound search for integer-feasible solutions.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::problem::Problem;
use crate::solution::Solution;
use crate::solver::Solver;

/// Integer solver that repeatedly solves relaxations with a wrapped [`Solver`]
/// and tightens variable bounds until every integer variable is integral.
pub struct BranchAndBoundSolver<'a, S: Solver + ?Sized> {
    relaxation: &'a S,
    /// Absolute integrality tolerance
    epsilon: f64,
    /// Explore the newest node first (stack) instead of the node with the
    /// best parent bound (heap)
    depth_first: bool,
}

/// Outcome of one [`BranchAndBoundSolver::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// The best integer-feasible solution, or a sentinel
    pub solution: Solution,
    /// Relaxations handed to the wrapped solver, the root included
    pub nodes_solved: usize,
    /// Nodes discarded as infeasible or unable to beat the incumbent
    pub nodes_pruned: usize,
    /// Objective of every incumbent, in the order they were found
    pub incumbents: Vec<f64>,
}

impl<'a, S: Solver + ?Sized> BranchAndBoundSolver<'a, S> {
    pub fn new(relaxation: &'a S, epsilon: f64, depth_first: bool) -> Self {
        Self {
            relaxation,
            epsilon,
            depth_first,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn depth_first(&self) -> bool {
        self.depth_first
    }

    /// Run the search and report its statistics alongside the solution
    pub fn search(&self, problem: &Problem) -> SearchReport {
        debug!(
            epsilon = self.epsilon(),
            depth_first = self.depth_first(),
            integer_variables = problem.integer_variables().len() as u64,
            "starting branch and bound"
        );
        let root = self.relaxation.run(problem);
        let mut report = SearchReport {
            solution: Solution::infeasible(problem.num_variables()),
            nodes_solved: 1,
            nodes_pruned: 0,
            incumbents: Vec::new(),
        };

        if root.is_infeasible() {
            debug!("root relaxation is infeasible");
            report.solution = root;
            return report;
        }

        let mut pending = Pending::new(self.depth_first);
        self.visit(problem, root, &mut pending, &mut report);

        while let Some(node) = pending.pop() {
            if node.bound <= report.solution.objective_value {
                trace!(bound = node.bound, "skipping node bounded by incumbent");
                report.nodes_pruned += 1;
                continue;
            }

            let relaxed = self.relaxation.run(&node.problem);
            report.nodes_solved += 1;
            self.visit(&node.problem, relaxed, &mut pending, &mut report);
        }

        debug!(
            objective = report.solution.objective_value,
            nodes_solved = report.nodes_solved as u64,
            nodes_pruned = report.nodes_pruned as u64,
            "branch and bound finished"
        );
        report
    }

    /// Prune, accept or branch on one solved relaxation. An unbounded
    /// relaxation is only accepted once its vertex is integral.
    fn visit(&self, problem: &Problem, relaxed: Solution, pending: &mut Pending, report: &mut SearchReport) {
        let bound = relaxed.objective_value;
        trace!(
            constraints = problem.num_constraints() as u64,
            bound,
            "visiting node"
        );

        if relaxed.is_infeasible() || bound <= report.solution.objective_value {
            report.nodes_pruned += 1;
            return;
        }

        let Some(variable) = self.branching_variable(problem, &relaxed.values) else {
            debug!(objective = bound, "new incumbent");
            report.incumbents.push(bound);
            report.solution = relaxed;
            return;
        };

        let value = relaxed.values[variable];
        let mut row = vec![0.0; problem.num_variables()];
        row[variable] = 1.0;
        let down = problem.push_constraint(&row, value.floor());
        row[variable] = -1.0;
        let up = problem.push_constraint(&row, -value.ceil());

        trace!(variable = variable as u64, value, "branching");
        pending.push_children(down, up, bound);
    }

    /// The integer variable whose value is furthest from integral, lowest
    /// index on ties. `None` when all integer variables are integral.
    fn branching_variable(&self, problem: &Problem, values: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (j, &v) in values.iter().enumerate() {
            if !problem.is_integer(j) || (v - v.round()).abs() <= self.epsilon {
                continue;
            }
            let distance = (v - v.floor() - 0.5).abs();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((j, distance));
            }
        }
        best.map(|(j, _)| j)
    }
}

impl<S: Solver + ?Sized> Solver for BranchAndBoundSolver<'_, S> {
    fn run(&self, problem: &Problem) -> Solution {
        self.search(problem).solution
    }
}

struct Node {
    problem: Problem,
    /// Relaxation objective of the parent
    bound: f64,
    seq: u64,
}

// Heap order: highest bound first, then oldest
impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bound
            .total_cmp(&other.bound)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

enum Frontier {
    Stack(Vec<Node>),
    Heap(BinaryHeap<Node>),
}

/// Sub-problems waiting to be solved
struct Pending {
    frontier: Frontier,
    next_seq: u64,
}

impl Pending {
    fn new(depth_first: bool) -> Self {
        let frontier = if depth_first {
            Frontier::Stack(Vec::new())
        } else {
            Frontier::Heap(BinaryHeap::new())
        };
        Self { frontier, next_seq: 0 }
    }

    /// Queue both children so that `down` is explored before `up`
    fn push_children(&mut self, down: Problem, up: Problem, bound: f64) {
        if matches!(self.frontier, Frontier::Stack(_)) {
            self.push(up, bound);
            self.push(down, bound);
        } else {
            self.push(down, bound);
            self.push(up, bound);
        }
    }

    fn push(&mut self, problem: Problem, bound: f64) {
        let node = Node {
            problem,
            bound,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        match &mut self.frontier {
            Frontier::Stack(stack) => stack.push(node),
            Frontier::Heap(heap) => heap.push(node),
        }
    }

    fn pop(&mut self) -> Option<Node> {
        match &mut self.frontier {
            Frontier::Stack(stack) => stack.pop(),
            Frontier::Heap(heap) => heap.pop(),
        }
    }
}
