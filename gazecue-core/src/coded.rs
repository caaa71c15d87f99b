/// An experimental factor whose levels are exported as small integer codes.
///
/// Every coded column in the results table uses [`Coded::code`], and the
/// legend table is built from [`Coded::VARIABLE`] and [`Coded::LEVELS`], so the
/// two can never disagree.
pub trait Coded: Copy + PartialEq + Sized + 'static {
    /// Name of the variable in the legend table.
    const VARIABLE: &'static str;
    /// All levels, in code order.
    const LEVELS: &'static [Self];

    fn code(self) -> u8;
    fn label(self) -> &'static str;

    /// `(label, code)` pairs for the legend.
    fn legend() -> Vec<(&'static str, u8)> {
        Self::LEVELS
            .iter()
            .map(|level| (level.label(), level.code()))
            .collect()
    }
}
