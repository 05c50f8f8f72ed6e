/// One move of a solution, expressed in the physical coordinates of the deal
/// it was solved from. Foundations are indexed by `deck * 4 + suit`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    StackToFoundation(usize, usize),
    FreecellToFoundation(usize, usize),
    /// A whole 13-card suit moved off a stack at once.
    SequenceToFoundation(usize, usize),
    StackToFreecell(usize, usize),
    FreecellToStack(usize, usize),
    StackToStack(usize, usize, usize), // (from_index, to_index, count)
    FlipCard(usize),
    Draw,
    Redeal,
    TalonToFoundation(usize),
    TalonToStack(usize),
    DealGypsyTalon,
}

impl Action {
    pub fn is_redeal(&self) -> bool {
        matches!(self, Action::Redeal)
    }

    /// Whether the action counts as a player move. Flips happen on their own.
    pub fn is_move(&self) -> bool {
        !matches!(self, Action::FlipCard(_))
    }

    /// Compact notation: stacks are numbered from 1, freecells are letters
    /// and every foundation is `h`.
    pub fn to_notation(&self) -> String {
        match *self {
            Action::StackToFoundation(stack, _) => format!("{}h", stack + 1),
            Action::FreecellToFoundation(cell, _) => format!("{}h", freecell_char(cell)),
            Action::SequenceToFoundation(stack, _) => format!("{}h@13", stack + 1),
            Action::StackToFreecell(stack, cell) => format!("{}{}", stack + 1, freecell_char(cell)),
            Action::FreecellToStack(cell, stack) => format!("{}{}", freecell_char(cell), stack + 1),
            Action::StackToStack(from, to, count) => {
                let mut str = format!("{}{}", from + 1, to + 1);
                if count > 1 {
                    str.push_str(&format!("@{count}"));
                }
                str
            }
            Action::FlipCard(stack) => format!("^{}", stack + 1),
            Action::Draw => "D".into(),
            Action::Redeal => "R".into(),
            Action::TalonToFoundation(_) => "th".into(),
            Action::TalonToStack(stack) => format!("t{}", stack + 1),
            Action::DealGypsyTalon => "G".into(),
        }
    }
}

fn freecell_char(idx: usize) -> char {
    (b'a' + idx as u8) as char
}

pub fn format_actions(actions: &[Action]) -> String {
    let mut list = vec![];
    let mut i = 0;
    while i < actions.len() {
        if let Action::Draw = actions[i] {
            let mut count = 1;
            while i + count < actions.len() && matches!(actions[i + count], Action::Draw) {
                count += 1;
            }
            let str = if count == 1 {
                "D".into()
            } else {
                format!("{count}D")
            };
            list.push(str);
            i += count;
            continue;
        }
        list.push(actions[i].to_notation());
        i += 1;
    }

    let mut output = String::new();
    let max_width = list.iter().map(|s| s.len()).max().unwrap_or_default() + 1;
    for chunk in list.chunks(10) {
        for cmd in chunk {
            output.push_str(&format!("{cmd:<width$}", width = max_width));
        }
        output.push('\n');
    }

    output
}

pub fn describe_action(action: &Action) -> String {
    match *action {
        Action::StackToFoundation(stack, foundation) => {
            format!("Move a card from stack {stack} to foundation {foundation}")
        }
        Action::FreecellToFoundation(cell, foundation) => {
            format!("Move a card from freecell {cell} to foundation {foundation}")
        }
        Action::SequenceToFoundation(stack, foundation) => {
            format!("Move the sequence on top of stack {stack} to foundation {foundation}")
        }
        Action::StackToFreecell(stack, cell) => {
            format!("Move a card from stack {stack} to freecell {cell}")
        }
        Action::FreecellToStack(cell, stack) => {
            format!("Move a card from freecell {cell} to stack {stack}")
        }
        Action::StackToStack(from, to, count) => {
            format!("Move {count} cards from stack {from} to stack {to}")
        }
        Action::FlipCard(stack) => format!("Flip the top card of stack {stack}"),
        Action::Draw => "Draw from the talon".into(),
        Action::Redeal => "Redeal the talon".into(),
        Action::TalonToFoundation(foundation) => {
            format!("Move the talon card to foundation {foundation}")
        }
        Action::TalonToStack(stack) => format!("Move the talon card to stack {stack}"),
        Action::DealGypsyTalon => "Deal the talon onto every stack".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_actions() {
        let actions = [
            Action::StackToFreecell(2, 0),
            Action::Draw,
            Action::Draw,
            Action::Draw,
            Action::TalonToStack(4),
            Action::StackToStack(0, 7, 3),
            Action::FreecellToFoundation(0, 3),
        ];
        let output = format_actions(&actions);
        let tokens: Vec<&str> = output.split_whitespace().collect();
        assert_eq!(tokens, ["3a", "3D", "t5", "18@3", "ah"]);
    }

    #[test]
    fn test_flip_is_not_a_move() {
        assert!(!Action::FlipCard(0).is_move());
        assert!(Action::Redeal.is_move());
        assert!(Action::Redeal.is_redeal());
    }
}
