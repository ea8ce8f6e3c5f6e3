//! Reception checklist selections shared by lots (CoA) and R&R forms

selection! {
    /// State of the packaging at reception
    pub enum PackagingState {
        Good => ("good", "Good state"),
        Damaged => ("damaged", "Damaged"),
    }
}

selection! {
    /// Whether an appendix (CoA, form, temperature chart) was attached
    pub enum AppendixState {
        Done => ("done", "Done"),
        NotDone => ("not_done", "Not done*"),
        NotApplicable => ("not_applicable", "Not applicable"),
    }
}

selection! {
    /// Conformity of received materials with the specification criteria
    pub enum Conformity {
        Yes => ("yes", "Yes"),
        No => ("no", "No*"),
        NotApplicable => ("not_applicable", "Not applicable"),
    }
}

selection! {
    /// Consistency between delivery note, order and delivered items
    pub enum Consistency {
        Consistent => ("consistent", "Consistent"),
        Different => ("different", "Different"),
        NotApplicable => ("not_applicable", "Not applicable"),
    }
}

selection! {
    /// Consistency of tested quantities with the quantities they should match
    pub enum ReconciliationConsistency {
        Consistent => ("consistent", "Consistent"),
        NotConsistent => ("not_consistent", "Not consistent"),
    }
}

selection! {
    /// Fate of not conformed quantities
    pub enum NotConformFate {
        Destroy => ("destroy", "Destroyed"),
        Other => ("other", "Other"),
    }
}

selection! {
    /// Storage temperature of a product or lot
    pub enum StorageTemperature {
        Rt => ("rt", "+15/+25°C (RT)"),
        TwoToEight => ("2_8", "+2/+8°C"),
        Minus80 => ("minus_80", "-80°C"),
    }
}

selection! {
    /// Final decision on a received lot
    pub enum LotStatus {
        Released => ("released", "Released for use"),
        Rejected => ("rejected", "Rejected"),
    }
}

/// True when the reception comment is still meaningful: an appendix is missing
/// or the materials do not conform.
pub fn reception_needs_explanation(
    first_appendix: Option<AppendixState>,
    temperature_appendix: Option<AppendixState>,
    materials_conformity: Option<Conformity>,
) -> bool {
    first_appendix == Some(AppendixState::NotDone)
        || temperature_appendix == Some(AppendixState::NotDone)
        || materials_conformity == Some(Conformity::No)
}
