//! Error types for routine construction

/// Program rejected by verification or compilation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    /// Program has no instructions
    #[error("program is empty")]
    Empty,

    /// Instruction pops more values than the stack holds
    #[error("stack underflow at {at} ({instr})")]
    StackUnderflow {
        /// Instruction index
        at: usize,
        /// Rendered instruction
        instr: String,
    },

    /// Local used before its declaration
    #[error("local {local} used at {at} but only {declared} declared")]
    UndeclaredLocal {
        /// Instruction index
        at: usize,
        /// Local index
        local: usize,
        /// Locals declared so far
        declared: usize,
    },

    /// Sibling index outside the program's sibling table
    #[error("sibling #{sibling} called at {at} but the graph provides {siblings}")]
    SiblingOutOfRange {
        /// Instruction index
        at: usize,
        /// Requested sibling
        sibling: usize,
        /// Sibling count
        siblings: usize,
    },

    /// Static members cannot be written
    #[error("store to static member {member} at {at}")]
    StaticStore {
        /// Instruction index
        at: usize,
        /// Rendered member
        member: String,
    },

    /// `Return` must leave exactly one value
    #[error("return at {at} with {depth} values on the stack")]
    UnbalancedReturn {
        /// Instruction index
        at: usize,
        /// Stack depth before return
        depth: usize,
    },

    /// Instructions follow `Return`
    #[error("unreachable code after return at {at}")]
    CodeAfterReturn {
        /// Index of the return
        at: usize,
    },

    /// Program does not end in `Return`
    #[error("program does not end with return")]
    MissingReturn,
}
