use crate::asn1::kerberos_time::KerberosTime as WireKerberosTime;
use crate::config::ConfigProvider;
use crate::constants::{
    CLOCK_RESYNC_THRESHOLD, CONFIG_KEY_CLOCKSKEW, CONFIG_SECTION_LIBDEFAULTS, DEFAULT_CLOCK_SKEW,
};
use crate::error::KrbError;
use der::{DecodeValue, EncodeValue, FixedTag, Tag};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

/// A point in time as Kerberos sees it. In memory this holds milliseconds since
/// the epoch and a microsecond remainder, which is what an authenticator needs
/// for `ctime`/`cusec`. On the wire only whole seconds are sent, and decoding
/// always yields a zero microsecond remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KerberosTime {
    millis: i64,
    micros: u16,
}

impl KerberosTime {
    pub fn new(millis: i64, micros: u16) -> Result<Self, KrbError> {
        if micros > 999 {
            return Err(KrbError::InvalidMicroseconds);
        }
        Ok(Self { millis, micros })
    }

    pub fn from_unix_duration(duration: Duration) -> Self {
        let millis = duration.as_millis().min(i64::MAX as u128) as i64;
        let micros = (duration.subsec_micros() % 1000) as u16;
        Self { millis, micros }
    }

    pub fn from_system_time(time: SystemTime) -> Result<Self, KrbError> {
        time.duration_since(UNIX_EPOCH)
            .map(Self::from_unix_duration)
            .map_err(|_| KrbError::DoYouHaveATimeMachine)
    }

    pub fn to_system_time(&self) -> SystemTime {
        let offset = Duration::from_millis(self.millis.unsigned_abs())
            + Duration::from_micros(self.micros as u64);
        if self.millis >= 0 {
            UNIX_EPOCH + offset
        } else {
            UNIX_EPOCH - Duration::from_millis(self.millis.unsigned_abs())
                + Duration::from_micros(self.micros as u64)
        }
    }

    /// Whole seconds since the epoch.
    pub fn seconds(&self) -> i64 {
        self.millis.div_euclid(1000)
    }

    /// The microsecond part of the second, as carried in `cusec`/`susec`.
    pub fn microseconds(&self) -> u32 {
        (self.millis.rem_euclid(1000) as u32) * 1000 + self.micros as u32
    }

    /// Rebuild a time from a wire timestamp and the separate microsecond field
    /// that KRB-ERROR and authenticators carry next to it.
    pub(crate) fn from_wire_parts(wire: &WireKerberosTime, usec: u32) -> Result<Self, KrbError> {
        if usec > 999_999 {
            error!(usec, "microsecond field is out of range");
            return Err(KrbError::InvalidMicroseconds);
        }
        let seconds = KerberosTime::from(wire).seconds();
        Self::new(seconds * 1000 + (usec / 1000) as i64, (usec % 1000) as u16)
    }

    /// This time with the sub second part removed, which is what survives a trip
    /// through the wire encoding.
    pub fn truncate_to_seconds(&self) -> Self {
        Self {
            millis: self.seconds() * 1000,
            micros: 0,
        }
    }

    pub(crate) fn to_wire(self) -> Result<WireKerberosTime, KrbError> {
        let seconds = u64::try_from(self.seconds()).map_err(|_| {
            error!(millis = self.millis, "KerberosTime is before the epoch");
            KrbError::DoYouHaveATimeMachine
        })?;
        WireKerberosTime::from_unix_duration(Duration::from_secs(seconds)).map_err(|err| {
            error!(?err, "WireKerberosTime::from_unix_duration");
            KrbError::DerEncodeKerberosTime
        })
    }
}

impl From<WireKerberosTime> for KerberosTime {
    fn from(value: WireKerberosTime) -> Self {
        Self::from_unix_duration(value.to_unix_duration())
    }
}

impl From<&WireKerberosTime> for KerberosTime {
    fn from(value: &WireKerberosTime) -> Self {
        Self::from_unix_duration(value.to_unix_duration())
    }
}

impl TryFrom<KerberosTime> for WireKerberosTime {
    type Error = KrbError;

    fn try_from(value: KerberosTime) -> Result<Self, Self::Error> {
        value.to_wire()
    }
}

impl FixedTag for KerberosTime {
    const TAG: Tag = Tag::GeneralizedTime;
}

impl<'a> DecodeValue<'a> for KerberosTime {
    type Error = der::Error;

    fn decode_value<R: der::Reader<'a>>(reader: &mut R, header: der::Header) -> der::Result<Self> {
        let wire = WireKerberosTime::decode_value(reader, header)?;
        Ok(KerberosTime::from(wire))
    }
}

impl EncodeValue for KerberosTime {
    fn value_len(&self) -> der::Result<der::Length> {
        self.to_wire()
            .map_err(|_| der::Error::from(der::ErrorKind::DateTime))?
            .value_len()
    }

    fn encode_value(&self, encoder: &mut impl der::Writer) -> der::Result<()> {
        self.to_wire()
            .map_err(|_| der::Error::from(der::ErrorKind::DateTime))?
            .encode_value(encoder)
    }
}

/// Wall clock and monotonic clock readings for a [KerberosClock].
pub trait ClockSource: Send + Sync {
    fn wall_clock(&self) -> SystemTime;

    fn monotonic(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClockSource;

impl ClockSource for SystemClockSource {
    fn wall_clock(&self) -> SystemTime {
        SystemTime::now()
    }

    fn monotonic(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy)]
struct ClockBaseline {
    wall: SystemTime,
    mono: Instant,
}

/// Provides "now" for the Kerberos exchanges. The reading is the wall clock
/// baseline advanced by the monotonic clock, so that small wall clock steps
/// do not make consecutive timestamps run backwards. If the estimate drifts
/// from the wall clock by more than 100ms the baseline is taken again.
#[derive(Debug)]
pub struct KerberosClock<S: ClockSource = SystemClockSource> {
    source: S,
    baseline: Mutex<ClockBaseline>,
}

impl KerberosClock<SystemClockSource> {
    pub fn new() -> Self {
        Self::with_source(SystemClockSource)
    }
}

impl Default for KerberosClock<SystemClockSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ClockSource> KerberosClock<S> {
    pub fn with_source(source: S) -> Self {
        let baseline = ClockBaseline {
            wall: source.wall_clock(),
            mono: source.monotonic(),
        };
        Self {
            source,
            baseline: Mutex::new(baseline),
        }
    }

    pub fn now_system_time(&self) -> SystemTime {
        let mono_now = self.source.monotonic();
        let wall_now = self.source.wall_clock();

        let mut baseline = self
            .baseline
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let estimate = baseline.wall + mono_now.saturating_duration_since(baseline.mono);

        let drift = match estimate.duration_since(wall_now) {
            Ok(d) => d,
            Err(e) => e.duration(),
        };

        if drift > CLOCK_RESYNC_THRESHOLD {
            debug!(?drift, "clock baseline resynchronised");
            *baseline = ClockBaseline {
                wall: wall_now,
                mono: mono_now,
            };
            wall_now
        } else {
            estimate
        }
    }

    pub fn now(&self) -> Result<KerberosTime, KrbError> {
        KerberosTime::from_system_time(self.now_system_time())
    }
}

/// True when the two times are no more than `maximum_clock_skew` apart, in
/// either direction.
pub fn is_within_allowed_skew(
    reference_time: SystemTime,
    other_time: SystemTime,
    maximum_clock_skew: Duration,
) -> bool {
    match reference_time.duration_since(other_time) {
        // The other time is equal to or earlier than reference_time
        Ok(diff) => diff <= maximum_clock_skew,
        // The other time is later than the reference time
        Err(diff) => diff.duration() <= maximum_clock_skew,
    }
}

/// The tolerated clock skew, from `clockskew` in `[libdefaults]`. A missing or
/// negative value falls back to five minutes.
pub fn maximum_clock_skew<C: ConfigProvider + ?Sized>(config: &C) -> Duration {
    match config.get_default_int_value(CONFIG_KEY_CLOCKSKEW, CONFIG_SECTION_LIBDEFAULTS) {
        Some(secs) if secs >= 0 => Duration::from_secs(secs as u64),
        _ => DEFAULT_CLOCK_SKEW,
    }
}
