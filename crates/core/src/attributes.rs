//! Entity attribute values with modifier stacks.
//!
//! Modifiers combine in three passes, matching the game's attribute rules:
//!
//! ```text
//! x = base + Σ add
//! y = x + Σ (x × multiply_base)
//! y = y × (1 + multiply_total)   (sequentially, per modifier)
//! ```

/// How a modifier combines with the attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ModifierOperation {
    /// Added to the base value (wire code 0).
    Add,
    /// Scales the post-add value (wire code 1).
    MultiplyBase,
    /// Scales the running total (wire code 2).
    MultiplyTotal,
}

impl TryFrom<u8> for ModifierOperation {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Add),
            1 => Ok(Self::MultiplyBase),
            2 => Ok(Self::MultiplyTotal),
            other => Err(other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeModifier {
    pub amount: f64,
    pub operation: ModifierOperation,
}

impl AttributeModifier {
    pub const fn new(amount: f64, operation: ModifierOperation) -> Self {
        Self { amount, operation }
    }
}

/// Attribute base value plus its active modifiers.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub base: f64,
    pub modifiers: Vec<AttributeModifier>,
}

impl Attribute {
    pub fn new(base: f64) -> Self {
        Self {
            base,
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifier(mut self, amount: f64, operation: ModifierOperation) -> Self {
        self.modifiers.push(AttributeModifier::new(amount, operation));
        self
    }

    /// Effective value after all three modifier passes.
    pub fn value(&self) -> f64 {
        let added = self.base + self.sum_of(ModifierOperation::Add);

        let mut total = added;
        for modifier in self.of(ModifierOperation::MultiplyBase) {
            total += added * modifier.amount;
        }
        for modifier in self.of(ModifierOperation::MultiplyTotal) {
            total += total * modifier.amount;
        }
        total
    }

    fn of(&self, operation: ModifierOperation) -> impl Iterator<Item = &AttributeModifier> {
        self.modifiers
            .iter()
            .filter(move |m| m.operation == operation)
    }

    fn sum_of(&self, operation: ModifierOperation) -> f64 {
        self.of(operation).map(|m| m.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_base_value() {
        assert_eq!(Attribute::new(20.0).value(), 20.0);
    }

    #[test]
    fn passes_apply_in_order_regardless_of_insertion() {
        // Inserted out of order on purpose: total, base, add.
        let attr = Attribute::new(10.0)
            .with_modifier(0.5, ModifierOperation::MultiplyTotal)
            .with_modifier(0.2, ModifierOperation::MultiplyBase)
            .with_modifier(2.0, ModifierOperation::Add);

        // x = 12, y = 12 + 12*0.2 = 14.4, y = 14.4 * 1.5 = 21.6
        assert!((attr.value() - 21.6).abs() < 1e-9);
    }

    #[test]
    fn multiply_base_uses_post_add_value_not_running_total() {
        let attr = Attribute::new(4.0)
            .with_modifier(0.5, ModifierOperation::MultiplyBase)
            .with_modifier(0.5, ModifierOperation::MultiplyBase);

        // Both scale x = 4: 4 + 2 + 2 = 8 (a compounding stack would give 9)
        assert_eq!(attr.value(), 8.0);
    }

    #[test]
    fn multiply_total_compounds() {
        let attr = Attribute::new(4.0)
            .with_modifier(0.5, ModifierOperation::MultiplyTotal)
            .with_modifier(0.5, ModifierOperation::MultiplyTotal);

        assert_eq!(attr.value(), 9.0);
    }

    #[test]
    fn wire_codes() {
        assert_eq!(ModifierOperation::try_from(1), Ok(ModifierOperation::MultiplyBase));
        assert_eq!(ModifierOperation::try_from(7), Err(7));
    }
}
