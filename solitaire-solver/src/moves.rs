use smallvec::SmallVec;
use std::fmt;

/// Move log of one derived state. Most tests emit a handful of moves.
pub type MoveStack = SmallVec<[Move; 8]>;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MoveKind {
    StackToFoundation,
    FreecellToFoundation,
    /// Thirteen cards of one suit leave a stack together.
    SequenceToFoundation,
    StackToFreecell,
    FreecellToStack,
    StackToStack,
    FlipCard,
    Draw,
    Redeal,
    TalonToFoundation,
    TalonToStack,
    /// One card from the front of a Gypsy talon onto `dest`.
    GypsyDeal,
    /// The board is canonicalized at this point of the log.
    Canonize,
}

/// One atomic transition. Stack and freecell indices are positions in the
/// canonical state the move is applied to; foundations are `deck * 4 + suit`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub kind: MoveKind,
    pub src: u8,
    pub dest: u8,
    pub count: u8,
}

impl Move {
    #[inline]
    pub fn new(kind: MoveKind, src: usize, dest: usize, count: usize) -> Self {
        debug_assert!(src <= u8::MAX as usize && dest <= u8::MAX as usize);
        Self {
            kind,
            src: src as u8,
            dest: dest as u8,
            count: count as u8,
        }
    }

    pub fn stack_to_foundation(stack: usize, foundation: usize) -> Self {
        Self::new(MoveKind::StackToFoundation, stack, foundation, 1)
    }

    pub fn freecell_to_foundation(cell: usize, foundation: usize) -> Self {
        Self::new(MoveKind::FreecellToFoundation, cell, foundation, 1)
    }

    pub fn sequence_to_foundation(stack: usize, foundation: usize) -> Self {
        Self::new(MoveKind::SequenceToFoundation, stack, foundation, 13)
    }

    pub fn stack_to_freecell(stack: usize, cell: usize) -> Self {
        Self::new(MoveKind::StackToFreecell, stack, cell, 1)
    }

    pub fn freecell_to_stack(cell: usize, stack: usize) -> Self {
        Self::new(MoveKind::FreecellToStack, cell, stack, 1)
    }

    pub fn stack_to_stack(from: usize, to: usize, count: usize) -> Self {
        Self::new(MoveKind::StackToStack, from, to, count)
    }

    pub fn flip(stack: usize) -> Self {
        Self::new(MoveKind::FlipCard, stack, 0, 0)
    }

    pub fn draw() -> Self {
        Self::new(MoveKind::Draw, 0, 0, 0)
    }

    pub fn redeal() -> Self {
        Self::new(MoveKind::Redeal, 0, 0, 0)
    }

    pub fn talon_to_foundation(foundation: usize) -> Self {
        Self::new(MoveKind::TalonToFoundation, 0, foundation, 1)
    }

    pub fn talon_to_stack(stack: usize) -> Self {
        Self::new(MoveKind::TalonToStack, 0, stack, 1)
    }

    pub fn gypsy_deal(stack: usize) -> Self {
        Self::new(MoveKind::GypsyDeal, 0, stack, 1)
    }

    pub fn canonize() -> Self {
        Self::new(MoveKind::Canonize, 0, 0, 0)
    }

    #[inline]
    pub fn is_canonize(&self) -> bool {
        self.kind == MoveKind::Canonize
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}({} -> {} x{})",
            self.kind, self.src, self.dest, self.count
        )
    }
}
