use std::fmt;

/// The seven expression categories scored by the expression model.
///
/// `ALL` fixes the iteration order to the model's output order; tie-breaking
/// in [`ExpressionScores::dominant`] depends on it being stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Expression {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Expression {
    pub const ALL: [Expression; 7] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Sad,
        Expression::Angry,
        Expression::Fearful,
        Expression::Disgusted,
        Expression::Surprised,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Expression::Neutral => "neutral",
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Angry => "angry",
            Expression::Fearful => "fearful",
            Expression::Disgusted => "disgusted",
            Expression::Surprised => "surprised",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Expression::Neutral => "😐",
            Expression::Happy => "😀",
            Expression::Sad => "😢",
            Expression::Angry => "😠",
            Expression::Fearful => "😨",
            Expression::Disgusted => "🤢",
            Expression::Surprised => "😲",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Emoji for an expression-category name. Names outside the known set map
/// to the fallback glyph.
pub fn emoji_for(name: &str) -> &'static str {
    Expression::ALL
        .iter()
        .find(|e| e.name() == name)
        .map(Expression::emoji)
        .unwrap_or("❓")
}

/// One probability per category, stored in `Expression::ALL` order.
///
/// Values come from independent model outputs and need not sum to 1.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionScores {
    values: [f32; 7],
}

impl ExpressionScores {
    /// Wraps raw probabilities given in `Expression::ALL` order.
    pub fn new(values: [f32; 7]) -> Self {
        Self { values }
    }

    pub fn get(&self, expression: Expression) -> f32 {
        self.values[Self::slot(expression)]
    }

    pub fn set(&mut self, expression: Expression, probability: f32) {
        self.values[Self::slot(expression)] = probability;
    }

    /// Iterates `(category, probability)` pairs in `Expression::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Expression, f32)> + '_ {
        Expression::ALL.iter().map(|&e| (e, self.get(e)))
    }

    /// The category with the strictly greatest probability.
    ///
    /// Ties resolve to the category encountered first in iteration order.
    /// Returns `None` when every probability is zero.
    pub fn dominant(&self) -> Option<Expression> {
        let mut best: Option<Expression> = None;
        let mut best_p = 0.0f32;
        for (expression, p) in self.iter() {
            if p > best_p {
                best = Some(expression);
                best_p = p;
            }
        }
        best
    }

    fn slot(expression: Expression) -> usize {
        Expression::ALL
            .iter()
            .position(|&e| e == expression)
            .expect("expression is in ALL")
    }
}
