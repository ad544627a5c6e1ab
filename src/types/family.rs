use std::fmt;
use std::sync::OnceLock;

/// Defines a closed family tag with a display name and a full-match pattern
/// per variant, plus the two-phase `resolve` lookup.
macro_rules! family {
    (
        $(#[$meta:meta])*
        pub enum $ty:ident {
            $( $variant:ident => ($name:literal, $pattern:literal), )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $ty {
            $( $variant, )+
        }

        impl $ty {
            /// All variants in declaration order.
            pub const ALL: &'static [$ty] = &[ $( $ty::$variant, )+ ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( $ty::$variant => $name, )+
                }
            }

            pub fn pattern(&self) -> &'static str {
                match self {
                    $( $ty::$variant => $pattern, )+
                }
            }

            /// Exact (case-insensitive) name match first, then each variant's
            /// pattern as a full match in declaration order; `Unknown` otherwise.
            pub fn resolve(text: &str) -> $ty {
                static PATTERNS: OnceLock<Vec<Option<regex::Regex>>> = OnceLock::new();
                let patterns = PATTERNS.get_or_init(|| compile_anchored(Self::ALL.iter().map(|f| f.pattern())));
                resolve_two_phase(text, Self::ALL, patterns, |f| f.name()).unwrap_or($ty::Unknown)
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                $ty::Unknown
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

fn compile_anchored<'a>(sources: impl Iterator<Item = &'a str>) -> Vec<Option<regex::Regex>> {
    sources
        .map(|src| regex::Regex::new(&format!("^(?:{src})$")).ok())
        .collect()
}

fn resolve_two_phase<T: Copy>(
    text: &str,
    values: &[T],
    patterns: &[Option<regex::Regex>],
    name: impl Fn(&T) -> &'static str,
) -> Option<T> {
    if let Some(v) = values.iter().find(|v| name(v).eq_ignore_ascii_case(text)) {
        return Some(*v);
    }
    values
        .iter()
        .zip(patterns)
        .find(|(_, re)| re.as_ref().is_some_and(|re| re.is_match(text)))
        .map(|(v, _)| *v)
}

family! {
    /// Rendering engine family.
    pub enum BrowserEngineFamily {
        Unknown => ("unknown", ""),
        Blink => ("Blink", "Blink"),
        WebKit => ("WebKit", "WebKit"),
        Trident => ("Trident", "Trident"),
        Presto => ("Presto", "Presto"),
        Gecko => ("Gecko", "Gecko"),
        Edge => ("Edge", "Edge(HTML)?"),
        Netfront => ("Netfront", "NetFront"),
        Khtml => ("Khtml", "KHTML"),
    }
}

family! {
    /// Operating system family.
    pub enum OperatingSystemFamily {
        Unknown => ("unknown", ""),
        Aix => ("AIX", "AIX"),
        AmigaOs => ("Amiga OS", "Amiga ?OS"),
        Android => ("Android", "Android"),
        Bada => ("Bada", "Bada"),
        BeOs => ("BeOS", "BeOS"),
        BlackBerryOs => ("BlackBerry OS", "BlackBerry( OS)?"),
        Brew => ("Brew", "Brew"),
        Bsd => ("BSD", "(Free|Net|Open|DragonFly)?BSD"),
        ChromeOs => ("Chrome OS", "Chrome ?OS"),
        DangerOs => ("DangerOS", "Danger ?OS"),
        FirefoxOs => ("Firefox OS", "Firefox OS"),
        Haiku => ("Haiku", "Haiku( OS)?"),
        HpUx => ("HP-UX", "HP-UX"),
        InfernoOs => ("Inferno OS", "Inferno( OS)?"),
        Ios => ("iOS", "iOS|iPhone OS"),
        Irix => ("IRIX", "IRIX"),
        Jvm => ("JVM", "JVM \\(Java\\)|Java"),
        Linux => ("Linux", "Linux( \\(.+\\))?"),
        MacOs => ("Mac OS", "Mac OS( [0-9].*)?|Macintosh"),
        Minix => ("MINIX", "MINIX"),
        MorphOs => ("MorphOS", "MorphOS"),
        MtkNucleusOs => ("MTK/Nucleus OS", "MTK/Nucleus OS"),
        Os2 => ("OS/2", "OS/2( Warp)?"),
        OsX => ("OS X", "(Mac )?OS X|macOS"),
        PalmOs => ("Palm OS", "Palm ?OS"),
        Qnx => ("QNX", "QNX"),
        RiscOs => ("RISC OS", "RISC ?OS"),
        SailfishOs => ("Sailfish OS", "Sailfish( OS)?"),
        SkyOs => ("SkyOS", "SkyOS"),
        Solaris => ("Solaris", "Solaris|SunOS"),
        Syllable => ("Syllable", "Syllable"),
        Symbian => ("Symbian OS", "Symbian( OS)?"),
        Tizen => ("Tizen", "Tizen"),
        WebOs => ("webOS", "web ?OS"),
        Windows => ("Windows", "Windows( .+)?"),
        XrossMediaBar => ("XrossMediaBar (XMB)", "XrossMediaBar( \\(XMB\\))?"),
    }
}

family! {
    /// Classification kind of a user agent.
    pub enum UserAgentType {
        Unknown => ("unknown", ""),
        Browser => ("Browser", "Browser"),
        EmailClient => ("Email client", "E-?mail client"),
        FeedReader => ("Feed Reader", "Feed ?Reader"),
        Library => ("Library", "Librar(y|ies)"),
        MediaPlayer => ("Multimedia Player", "(Multimedia|Media) ?Player"),
        MobileBrowser => ("Mobile Browser", "Mobile ?Browser"),
        OfflineBrowser => ("Offline Browser", "Offline ?Browser"),
        Other => ("Other", "Other"),
        Robot => ("Robot", "Robot|Bot|Crawler"),
        UseragentAnonymizer => ("Useragent Anonymizer", "(User ?agent )?Anonymi[sz]er"),
        Validator => ("Validator", "Validator"),
        WapBrowser => ("Wap Browser", "WAP ?Browser"),
    }
}

family! {
    /// Device class of the originating client.
    pub enum Category {
        Unknown => ("unknown", ""),
        GameConsole => ("Game console", "Game ?console|Console"),
        Other => ("Other", "Other"),
        Pda => ("PDA", "PDA"),
        PersonalComputer => ("Personal computer", "Personal ?computer|Desktop|PC"),
        SmartTv => ("Smart TV", "Smart ?TV|TV"),
        Smartphone => ("Smartphone", "Smart ?phone|Mobile ?phone"),
        Tablet => ("Tablet", "Tablet"),
        WearableComputer => ("Wearable computer", "Wearable( computer)?"),
    }
}

family! {
    /// Well-known user-agent families. Names not listed here resolve to
    /// `Unknown`; the rule name is still reported on the result.
    pub enum UserAgentFamily {
        Unknown => ("unknown", ""),
        AndroidBrowser => ("Android Webkit", "Android (Web[Kk]it|Browser)"),
        AnonymouseOrg => ("Anonymouse.org", "Anonymouse(\\.org)?"),
        AppleMail => ("Apple Mail", "Apple ?Mail"),
        Baiduspider => ("Baiduspider", "Baidu ?spider"),
        Bingbot => ("bingbot", "bingbot|msnbot"),
        Chrome => ("Chrome", "Chrome|Google Chrome"),
        ChromeMobile => ("Chrome Mobile", "Chrome Mobile|CriOS"),
        Chromium => ("Chromium", "Chromium"),
        Curl => ("cURL", "curl"),
        DuckDuckBot => ("DuckDuckBot", "DuckDuck ?Bot"),
        Edge => ("Edge", "(Microsoft )?Edge"),
        Firefox => ("Firefox", "Firefox|Mozilla Firefox"),
        FirefoxMobile => ("Firefox Mobile", "Firefox (Mobile|for Android)"),
        Googlebot => ("Googlebot", "Googlebot(-[A-Za-z]+)?"),
        Ie => ("IE", "IE|MSIE|Internet Explorer"),
        IeMobile => ("IE Mobile", "IE ?Mobile"),
        Java => ("Java", "Java"),
        Konqueror => ("Konqueror", "Konqueror"),
        MobileSafari => ("Mobile Safari", "Mobile Safari"),
        Netscape => ("Netscape Navigator", "Netscape( Navigator)?"),
        Opera => ("Opera", "Opera"),
        OperaMini => ("Opera Mini", "Opera ?Mini"),
        OperaMobile => ("Opera Mobile", "Opera ?Mobi(le)?"),
        PythonUrllib => ("Python-urllib", "Python-?urllib"),
        Safari => ("Safari", "Safari"),
        SamsungInternet => ("Samsung Internet", "Samsung ?(Internet|Browser)"),
        SiteSucker => ("SiteSucker", "SiteSucker"),
        Skyfire => ("Skyfire", "Skyfire"),
        Thunderbird => ("Thunderbird", "(Mozilla )?Thunderbird"),
        UcBrowser => ("UC Browser", "UC ?Browser"),
        W3cValidator => ("W3C Validator", "W3C[_ ]Validator"),
        Wget => ("Wget", "Wget"),
        YandexBot => ("YandexBot", "Yandex ?Bot"),
    }
}
