//! Daemon status codes.
//!
//! A negative `p3` in a response header is a status code defined by the
//! daemon. Codes -1 through -146 come from the daemon's own validation;
//! -2000 through -2012 are the interface block shared by client and daemon
//! for socket, connect and allocation failures. Anything else maps to
//! [`DaemonStatus::Unknown`] since the daemon's code space can grow.

use std::fmt;

macro_rules! daemon_status {
    ($($code:literal => $variant:ident: $message:literal,)+) => {
        /// Classification of a negative daemon status.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum DaemonStatus {
            $(
                #[doc = $message]
                $variant,
            )+
            /// A code this client does not know about.
            Unknown(i32),
        }

        impl DaemonStatus {
            /// Map a status code to its kind. Total over `i32`.
            pub fn from_code(code: i32) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }

            /// The wire code for this kind.
            pub fn code(&self) -> i32 {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown(code) => *code,
                }
            }

            /// Human-readable description.
            pub fn message(&self) -> &'static str {
                match self {
                    $(Self::$variant => $message,)+
                    Self::Unknown(_) => "unknown error",
                }
            }
        }
    };
}

daemon_status! {
    -1 => InitFailed: "initialisation failed",
    -2 => BadUserGpio: "GPIO not 0-31",
    -3 => BadGpio: "GPIO not 0-53",
    -4 => BadMode: "mode not 0-7",
    -5 => BadLevel: "level not 0-1",
    -6 => BadPud: "pud not 0-2",
    -7 => BadPulsewidth: "pulsewidth not 0 or 500-2500",
    -8 => BadDutycycle: "dutycycle not 0-range (default 255)",
    -9 => BadTimer: "timer not 0-9",
    -10 => BadMs: "ms not 10-60000",
    -11 => BadTimetype: "timetype not 0-1",
    -12 => BadSeconds: "seconds < 0",
    -13 => BadMicros: "micros not 0-999999",
    -14 => TimerFailed: "gpioSetTimerFunc failed",
    -15 => BadWdogTimeout: "timeout not 0-60000",
    -16 => NoAlertFunc: "DEPRECATED",
    -17 => BadClkPeriph: "clock peripheral not 0-1",
    -18 => BadClkSource: "DEPRECATED",
    -19 => BadClkMicros: "clock micros not 1, 2, 4, 5, 8, or 10",
    -20 => BadBufMillis: "buf millis not 100-10000",
    -21 => BadDutyrange: "dutycycle range not 25-40000",
    -22 => BadSignum: "signum not 0-63",
    -23 => BadPathname: "can't open pathname",
    -24 => NoHandle: "no handle available",
    -25 => BadHandle: "unknown handle",
    -26 => BadIfFlags: "ifFlags > 4",
    -27 => BadChannel: "DMA channel not 0-15",
    -28 => BadSocketPort: "socket port not 1024-30000",
    -29 => BadFifoCommand: "unknown fifo command",
    -30 => BadSecoChannel: "DMA secondary channel not 0-15",
    -31 => NotInitialised: "function called before gpioInitialise",
    -32 => Initialised: "function called after gpioInitialise",
    -33 => BadWaveMode: "waveform mode not 0-1",
    -34 => BadCfgInternal: "bad parameter in gpioCfgInternals call",
    -35 => BadWaveBaud: "baud rate not 50-250K(RX)/50-1M(TX)",
    -36 => TooManyPulses: "waveform has too many pulses",
    -37 => TooManyChars: "waveform has too many chars",
    -38 => NotSerialGpio: "no bit bang serial read in progress on GPIO",
    -39 => BadSerialStruc: "bad (null) serial structure parameter",
    -40 => BadSerialBuf: "bad (null) serial buf parameter",
    -41 => NotPermitted: "no permission to update GPIO",
    -42 => SomePermitted: "no permission to update one or more GPIO",
    -43 => BadWvscCommnd: "bad WVSC subcommand",
    -44 => BadWvsmCommnd: "bad WVSM subcommand",
    -45 => BadWvspCommnd: "bad WVSP subcommand",
    -46 => BadPulselen: "trigger pulse length not 1-100",
    -47 => BadScript: "invalid script",
    -48 => BadScriptId: "unknown script id",
    -49 => BadSerOffset: "add serial data offset > 30 minute",
    -50 => GpioInUse: "GPIO already in use",
    -51 => BadSerialCount: "must read at least a byte at a time",
    -52 => BadParamNum: "script parameter id not 0-9",
    -53 => DupTag: "script has duplicate tag",
    -54 => TooManyTags: "script has too many tags",
    -55 => BadScriptCmd: "illegal script command",
    -56 => BadVarNum: "script variable id not 0-149",
    -57 => NoScriptRoom: "no more room for scripts",
    -58 => NoMemory: "can't allocate temporary memory",
    -59 => SockReadFailed: "socket read failed",
    -60 => SockWritFailed: "socket write failed",
    -61 => TooManyParam: "too many script parameters (> 10)",
    -62 => ScriptNotReady: "script initialising",
    -63 => BadTag: "script has unresolved tag",
    -64 => BadMicsDelay: "bad MICS delay (too large)",
    -65 => BadMilsDelay: "bad MILS delay (too large)",
    -66 => BadWaveId: "non existent wave id",
    -67 => TooManyCbs: "No more CBs for waveform",
    -68 => TooManyOol: "No more OOL for waveform",
    -69 => EmptyWaveform: "attempt to create an empty waveform",
    -70 => NoWaveformId: "no more waveform ids",
    -71 => I2cOpenFailed: "can't open I2C device",
    -72 => SerOpenFailed: "can't open serial device",
    -73 => SpiOpenFailed: "can't open SPI device",
    -74 => BadI2cBus: "bad I2C bus",
    -75 => BadI2cAddr: "bad I2C address",
    -76 => BadSpiChannel: "bad SPI channel",
    -77 => BadFlags: "bad i2c/spi/ser open flags",
    -78 => BadSpiSpeed: "bad SPI speed",
    -79 => BadSerDevice: "bad serial device name",
    -80 => BadSerSpeed: "bad serial baud rate",
    -81 => BadParam: "bad i2c/spi/ser parameter",
    -82 => I2cWriteFailed: "I2C write failed",
    -83 => I2cReadFailed: "I2C read failed",
    -84 => BadSpiCount: "bad SPI count",
    -85 => SerWriteFailed: "ser write failed",
    -86 => SerReadFailed: "ser read failed",
    -87 => SerReadNoData: "ser read no data available",
    -88 => UnknownCommand: "unknown command",
    -89 => SpiXferFailed: "spi xfer/read/write failed",
    -90 => BadPointer: "bad (NULL) pointer",
    -91 => NoAuxSpi: "no auxiliary SPI on Pi A or B",
    -92 => NotPwmGpio: "GPIO is not in use for PWM",
    -93 => NotServoGpio: "GPIO is not in use for servo pulses",
    -94 => NotHclkGpio: "GPIO has no hardware clock",
    -95 => NotHpwmGpio: "GPIO has no hardware PWM",
    -96 => BadHpwmFreq: "invalid hardware PWM frequency",
    -97 => BadHpwmDuty: "hardware PWM dutycycle not 0-1M",
    -98 => BadHclkFreq: "invalid hardware clock frequency",
    -99 => BadHclkPass: "need password to use hardware clock 1",
    -100 => HpwmIllegal: "illegal, PWM in use for main clock",
    -101 => BadDatabits: "serial data bits not 1-32",
    -102 => BadStopbits: "serial (half) stop bits not 2-8",
    -103 => MsgToobig: "socket/pipe message too big",
    -104 => BadMallocMode: "bad memory allocation mode",
    -105 => TooManySegs: "too many I2C transaction segments",
    -106 => BadI2cSeg: "an I2C transaction segment failed",
    -107 => BadSmbusCmd: "SMBus command not supported by driver",
    -108 => NotI2cGpio: "no bit bang I2C in progress on GPIO",
    -109 => BadI2cWlen: "bad I2C write length",
    -110 => BadI2cRlen: "bad I2C read length",
    -111 => BadI2cCmd: "bad I2C command",
    -112 => BadI2cBaud: "bad I2C baud rate, not 50-500k",
    -113 => ChainLoopCnt: "bad chain loop count",
    -114 => BadChainLoop: "empty chain loop",
    -115 => ChainCounter: "too many chain counters",
    -116 => BadChainCmd: "bad chain command",
    -117 => BadChainDelay: "bad chain delay micros",
    -118 => ChainNesting: "chain counters nested too deeply",
    -119 => ChainTooBig: "chain is too long",
    -120 => Deprecated: "deprecated function removed",
    -121 => BadSerInvert: "bit bang serial invert not 0 or 1",
    -122 => BadEdge: "bad ISR edge, not 0, 1, or 2",
    -123 => BadIsrInit: "bad ISR initialisation",
    -124 => BadForever: "loop forever must be last chain command",
    -125 => BadFilter: "bad filter parameter",
    -126 => BadPad: "bad pad number",
    -127 => BadStrength: "bad pad drive strength",
    -128 => FilOpenFailed: "file open failed",
    -129 => BadFileMode: "bad file mode",
    -130 => BadFileFlag: "bad file flag",
    -131 => BadFileRead: "bad file read",
    -132 => BadFileWrite: "bad file write",
    -133 => FileNotRopen: "file not open for read",
    -134 => FileNotWopen: "file not open for write",
    -135 => BadFileSeek: "bad file seek",
    -136 => NoFileMatch: "no files match pattern",
    -137 => NoFileAccess: "no permission to access file",
    -138 => FileIsADir: "file is a directory",
    -139 => BadShellStatus: "bad shell return status",
    -140 => BadScriptName: "bad script name",
    -141 => BadSpiBaud: "bad SPI baud rate, not 50-500k",
    -142 => NotSpiGpio: "no bit bang SPI in progress on GPIO",
    -143 => BadEventId: "bad event id",
    -144 => CmdInterrupted: "command interrupted, Python",
    -145 => NotOnBcm2711: "not available on BCM2711",
    -146 => OnlyOnBcm2711: "only available on BCM2711",
    -2000 => IfBadSend: "failed to send to pigpiod",
    -2001 => IfBadRecv: "failed to receive from pigpiod",
    -2002 => IfBadGetaddrinfo: "failed to find address of pigpiod",
    -2003 => IfBadConnect: "failed to connect to pigpiod",
    -2004 => IfBadSocket: "failed to create socket",
    -2005 => IfBadNoib: "failed to open notification in band",
    -2006 => IfDuplicateCallback: "identical callback exists",
    -2007 => IfBadMalloc: "failed to malloc",
    -2008 => IfBadCallback: "bad callback parameter",
    -2009 => IfNotifyFailed: "failed to create notification thread",
    -2010 => IfCallbackNotFound: "callback not found",
    -2011 => IfUnconnectedPi: "not connected to Pi",
    -2012 => IfTooManyPis: "too many connected Pis",
}

impl DaemonStatus {
    /// Returns true for the client/daemon interface block (-2000 to -2012).
    pub fn is_interface_error(&self) -> bool {
        matches!(self.code(), -2012..=-2000)
    }
}

impl From<i32> for DaemonStatus {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl std::error::Error for DaemonStatus {}
