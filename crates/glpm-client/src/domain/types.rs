//! Glucose profile data types.
//!
//! Records arrive from the sensor already decoded by the server. Every
//! record type has a fixed wire layout, so the enums below encode as
//! their variant index and the flag sets as a plain `u32`.

use crate::error::{GlpmError, GlpmResult};
use serde::{Deserialize, Serialize};

/// Largest sequence number a record can carry.
pub const MAXIMUM_SEQUENCE_NUMBER: u32 = 65_535;

macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$flag_meta:meta])* $flag:ident = $value:expr,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            $($(#[$flag_meta])* pub const $flag: Self = Self($value);)+

            pub const fn bits(&self) -> u32 {
                self.0
            }

            pub const fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }
    };
}

flag_set!(
    /// Fields present in a [`GlucoseMeasurement`].
    MeasurementFlags {
        TIME_OFFSET_PRESENT = 0x0000_0001,
        CONCENTRATION_PRESENT = 0x0000_0002,
        CONCENTRATION_IN_MOL_PER_LITER = 0x0000_0004,
        SENSOR_STATUS_PRESENT = 0x0000_0010,
        TIME_OFFSET_OVERRUN = 0x0000_0020,
        TIME_OFFSET_UNDERRUN = 0x0000_0040,
    }
);

flag_set!(
    /// Sensor status annunciation.
    SensorStatus {
        BATTERY_LOW_AT_TIME_OF_MEASUREMENT = 0x0000_0001,
        SENSOR_MALFUNCTION = 0x0000_0002,
        SAMPLE_SIZE_INSUFFICIENT = 0x0000_0004,
        STRIP_INSERTION_ERROR = 0x0000_0008,
        STRIP_TYPE_INCORRECT = 0x0000_0010,
        SENSOR_RESULT_TOO_HIGH = 0x0000_0020,
        SENSOR_RESULT_TOO_LOW = 0x0000_0040,
        SENSOR_TEMPERATURE_TOO_HIGH = 0x0000_0080,
        SENSOR_TEMPERATURE_TOO_LOW = 0x0000_0100,
        SENSOR_READ_INTERRUPTED = 0x0000_0200,
        GENERAL_DEVICE_FAULT = 0x0000_0400,
        TIME_FAULT = 0x0000_0800,
    }
);

flag_set!(
    /// Fields present in a [`GlucoseMeasurementContext`].
    ContextFlags {
        CARBOHYDRATE_DATA_PRESENT = 0x0000_0001,
        MEAL_TYPE_PRESENT = 0x0000_0002,
        TESTER_TYPE_AND_HEALTH_TYPE_PRESENT = 0x0000_0004,
        EXERCISE_DATA_PRESENT = 0x0000_0008,
        EXERCISE_DATA_DURATION_OVERRUN = 0x0000_0010,
        MEDICATION_DATA_PRESENT = 0x0000_0020,
        MEDICATION_DATA_UNITS_LITERS = 0x0000_0040,
        HBA1C_PRESENT = 0x0000_0080,
        EXTENDED_FLAGS_PRESENT = 0x0000_0100,
    }
);

flag_set!(
    /// Features a sensor advertises when it connects.
    SupportedFeatures {
        LOW_BATTERY_DETECTION_DURING_MEASUREMENT = 0x0000_0001,
        SENSOR_MALFUNCTION_DETECTION = 0x0000_0002,
        SENSOR_SAMPLE_SIZE = 0x0000_0004,
        SENSOR_STRIP_INSERTION_ERROR_DETECTION = 0x0000_0008,
        SENSOR_STRIP_TYPE_ERROR_DETECTION = 0x0000_0010,
        SENSOR_RESULT_HIGH_LOW_DETECTION = 0x0000_0020,
        SENSOR_TEMPERATURE_HIGH_LOW_DETECTION = 0x0000_0040,
        SENSOR_READ_INTERRUPT_DETECTION = 0x0000_0080,
        GENERAL_DEVICE_FAULT = 0x0000_0100,
        TIME_FAULT = 0x0000_0200,
        MULTIPLE_BOND_SUPPORT = 0x0000_0400,
        GLUCOSE_MEASUREMENT_CONTEXT = 0x0001_0000,
    }
);

flag_set!(
    /// Which records a measurement notification carries.
    MeasurementMessageFlags {
        MEASUREMENT_DATA_PRESENT = 0x0000_0001,
        CONTEXT_DATA_PRESENT = 0x0000_0002,
    }
);

/// Role of the remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionType {
    #[default]
    Sensor,
    Collector,
}

/// Record access procedure requested from a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProcedureType {
    #[default]
    ReportStoredRecords,
    DeleteStoredRecords,
    AbortProcedure,
    ReportNumberStoredRecords,
}

/// Record selection operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperatorType {
    #[default]
    AllRecords,
    LessThanOrEqualTo,
    GreaterThanOrEqualTo,
    WithinRangeOf,
    FirstRecord,
    LastRecord,
}

impl OperatorType {
    pub fn needs_single_value(&self) -> bool {
        matches!(self, Self::LessThanOrEqualTo | Self::GreaterThanOrEqualTo)
    }

    pub fn needs_range(&self) -> bool {
        matches!(self, Self::WithinRangeOf)
    }
}

/// What a filter compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    SequenceNumber,
    UserFacingTime,
}

/// Calendar time as reported by the sensor.
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DateTime {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl DateTime {
    pub fn new(year: u32, month: u32, day: u32, hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            year,
            month,
            day,
            hours,
            minutes,
            seconds,
        }
    }
}

/// Filter operand of a record access procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterParameters {
    SequenceNumber(u32),
    UserFacingTime(DateTime),
    SequenceNumberRange { min: u32, max: u32 },
    UserFacingTimeRange { min: DateTime, max: DateTime },
}

impl FilterParameters {
    pub fn filter_type(&self) -> FilterType {
        match self {
            Self::SequenceNumber(_) | Self::SequenceNumberRange { .. } => FilterType::SequenceNumber,
            Self::UserFacingTime(_) | Self::UserFacingTimeRange { .. } => FilterType::UserFacingTime,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Self::SequenceNumberRange { .. } | Self::UserFacingTimeRange { .. }
        )
    }
}

/// A record access procedure to run on a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureData {
    pub procedure_type: ProcedureType,
    pub operator: OperatorType,
    /// Ignored by operators that select without an operand.
    pub filter: Option<FilterParameters>,
}

impl ProcedureData {
    pub fn new(
        procedure_type: ProcedureType,
        operator: OperatorType,
        filter: Option<FilterParameters>,
    ) -> Self {
        Self {
            procedure_type,
            operator,
            filter,
        }
    }

    /// Report every stored record.
    pub fn report_all() -> Self {
        Self::new(ProcedureType::ReportStoredRecords, OperatorType::AllRecords, None)
    }

    /// Report the number of stored records.
    pub fn report_number_of_records() -> Self {
        Self::new(
            ProcedureType::ReportNumberStoredRecords,
            OperatorType::AllRecords,
            None,
        )
    }

    /// Report records with sequence numbers in `min..=max`.
    pub fn report_sequence_range(min: u32, max: u32) -> Self {
        Self::new(
            ProcedureType::ReportStoredRecords,
            OperatorType::WithinRangeOf,
            Some(FilterParameters::SequenceNumberRange { min, max }),
        )
    }

    /// Abort whatever procedure is outstanding on the sensor.
    pub fn abort() -> Self {
        Self::new(ProcedureType::AbortProcedure, OperatorType::AllRecords, None)
    }

    /// Check that the operator and its operand agree.
    pub fn validate(&self) -> GlpmResult<()> {
        if self.operator.needs_range() || self.operator.needs_single_value() {
            let filter = self.filter.ok_or_else(|| {
                GlpmError::invalid(format!("operator {:?} requires a filter", self.operator))
            })?;

            if self.operator.needs_range() != filter.is_range() {
                return Err(GlpmError::invalid(format!(
                    "operator {:?} does not accept filter {:?}",
                    self.operator,
                    filter.filter_type()
                )));
            }
        }

        match self.filter {
            Some(FilterParameters::SequenceNumber(n)) if n > MAXIMUM_SEQUENCE_NUMBER => Err(
                GlpmError::invalid(format!("sequence number {n} out of range")),
            ),
            Some(FilterParameters::SequenceNumberRange { min, max })
                if min > MAXIMUM_SEQUENCE_NUMBER || max > MAXIMUM_SEQUENCE_NUMBER =>
            {
                Err(GlpmError::invalid("sequence number range out of range"))
            }
            Some(FilterParameters::SequenceNumberRange { min, max }) if min > max => {
                Err(GlpmError::invalid("sequence number range is inverted"))
            }
            Some(FilterParameters::UserFacingTimeRange { min, max }) if min > max => {
                Err(GlpmError::invalid("user facing time range is inverted"))
            }
            _ => Ok(()),
        }
    }
}

/// Outcome of a record access procedure, as reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResponseCode {
    #[default]
    Success,
    OpcodeNotSupported,
    InvalidOperator,
    OperatorNotSupported,
    InvalidOperand,
    NoRecordsFound,
    AbortUnsuccessful,
    ProcedureNotCompleted,
    OperandNotSupported,
    ProcedureTimeout,
    Unknown,
}

/// Problems the server found while pairing measurement and context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeasurementErrorType {
    #[default]
    NoError,
    NoGlucoseContext,
    SequenceNumberMismatch,
    UnexpectedPacket,
    InvalidData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeasurementType {
    #[default]
    CapillaryWholeBlood,
    CapillaryPlasma,
    VenousWholeBlood,
    VenousPlasma,
    ArterialWholeBlood,
    ArterialPlasma,
    UndeterminedWholeBlood,
    UndeterminedPlasma,
    InterstitialFluid,
    ControlSolution,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleLocation {
    #[default]
    Finger,
    AlternateSiteTest,
    Earlobe,
    ControlSolution,
    LocationNotAvailable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MealType {
    #[default]
    Preprandial,
    Postprandial,
    Fasting,
    Casual,
    Bedtime,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TesterType {
    #[default]
    SelfTest,
    HealthCareProfessional,
    LabTest,
    NotAvailable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HealthType {
    #[default]
    MinorHealthIssues,
    MajorHealthIssues,
    DuringMenses,
    UnderStress,
    NoHealthIssues,
    NotAvailable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CarbohydrateId {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Drink,
    Supper,
    Brunch,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MedicationId {
    #[default]
    RapidActingInsulin,
    ShortActingInsulin,
    IntermediateActingInsulin,
    LongActingInsulin,
    PremixedInsulin,
    Unknown,
}

/// Special values of an IEEE-11073 SFLOAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FloatType {
    #[default]
    Valid,
    NotANumber,
    NotAtThisResolution,
    PositiveInfinity,
    NegativeInfinity,
    Rfu,
}

/// A short float as `mantissa * 10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FloatingPoint {
    pub value_type: FloatType,
    pub mantissa: i32,
    pub exponent: i32,
}

impl FloatingPoint {
    pub fn new(mantissa: i32, exponent: i32) -> Self {
        Self {
            value_type: FloatType::Valid,
            mantissa,
            exponent,
        }
    }

    /// Numeric value, or `None` for the special values.
    pub fn to_f64(&self) -> Option<f64> {
        match self.value_type {
            FloatType::Valid => Some(f64::from(self.mantissa) * 10f64.powi(self.exponent)),
            FloatType::PositiveInfinity => Some(f64::INFINITY),
            FloatType::NegativeInfinity => Some(f64::NEG_INFINITY),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Concentration {
    pub value: FloatingPoint,
    pub measurement_type: MeasurementType,
    pub sample_location: SampleLocation,
}

/// One glucose measurement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GlucoseMeasurement {
    pub flags: MeasurementFlags,
    pub sequence_number: u32,
    pub base_time: DateTime,
    /// Minutes relative to `base_time`.
    pub time_offset: i32,
    pub concentration: Concentration,
    pub sensor_status: SensorStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Carbohydrate {
    pub id: CarbohydrateId,
    pub value: FloatingPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Exercise {
    pub duration: u32,
    pub intensity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Medication {
    pub id: MedicationId,
    pub value: FloatingPoint,
}

/// Context record paired with a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GlucoseMeasurementContext {
    pub flags: ContextFlags,
    pub sequence_number: u32,
    pub extended_flags: u32,
    pub carbohydrate: Carbohydrate,
    pub meal: MealType,
    pub tester: TesterType,
    pub health: HealthType,
    pub exercise: Exercise,
    pub medication: Medication,
    pub hba1c: FloatingPoint,
}
