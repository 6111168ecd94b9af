//! Country table used to resolve spoken country names.

use voxsign_types::Country;

/// Countries offered by the signup form, with English and Arabic names.
pub static COUNTRIES: &[Country] = &[
    Country::new("SA", "Saudi Arabia", "السعودية"),
    Country::new("AE", "United Arab Emirates", "الإمارات"),
    Country::new("KW", "Kuwait", "الكويت"),
    Country::new("QA", "Qatar", "قطر"),
    Country::new("BH", "Bahrain", "البحرين"),
    Country::new("OM", "Oman", "عمان"),
    Country::new("YE", "Yemen", "اليمن"),
    Country::new("IQ", "Iraq", "العراق"),
    Country::new("JO", "Jordan", "الأردن"),
    Country::new("SY", "Syria", "سوريا"),
    Country::new("LB", "Lebanon", "لبنان"),
    Country::new("PS", "Palestine", "فلسطين"),
    Country::new("EG", "Egypt", "مصر"),
    Country::new("SD", "Sudan", "السودان"),
    Country::new("SS", "South Sudan", "جنوب السودان"),
    Country::new("LY", "Libya", "ليبيا"),
    Country::new("TN", "Tunisia", "تونس"),
    Country::new("DZ", "Algeria", "الجزائر"),
    Country::new("MA", "Morocco", "المغرب"),
    Country::new("MR", "Mauritania", "موريتانيا"),
    Country::new("SO", "Somalia", "الصومال"),
    Country::new("DJ", "Djibouti", "جيبوتي"),
    Country::new("KM", "Comoros", "جزر القمر"),
    Country::new("TR", "Turkey", "تركيا"),
    Country::new("IR", "Iran", "إيران"),
    Country::new("PK", "Pakistan", "باكستان"),
    Country::new("IN", "India", "الهند"),
    Country::new("ID", "Indonesia", "إندونيسيا"),
    Country::new("MY", "Malaysia", "ماليزيا"),
    Country::new("CN", "China", "الصين"),
    Country::new("JP", "Japan", "اليابان"),
    Country::new("GB", "United Kingdom", "المملكة المتحدة"),
    Country::new("US", "United States", "الولايات المتحدة"),
    Country::new("CA", "Canada", "كندا"),
    Country::new("FR", "France", "فرنسا"),
    Country::new("DE", "Germany", "ألمانيا"),
    Country::new("ES", "Spain", "إسبانيا"),
    Country::new("IT", "Italy", "إيطاليا"),
    Country::new("NL", "Netherlands", "هولندا"),
    Country::new("SE", "Sweden", "السويد"),
    Country::new("AU", "Australia", "أستراليا"),
    Country::new("BR", "Brazil", "البرازيل"),
    Country::new("NG", "Nigeria", "نيجيريا"),
];
