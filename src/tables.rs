//! Shared lookup tables for the FM synthesis pipeline
//!
//! Every chip family in this crate reads its waveforms through the same pair
//! of quarter-sine and exponential ROMs that the original dies carried: a
//! 256-entry log-sine table holding attenuation values in 1/256th-of-a-bit
//! units, and a 256-entry power-of-two table used to leave the logarithmic
//! domain again. Both are computed once at startup and shared.
//!
//! The remaining tables are literal ROM contents: envelope rate tables
//! (one set for the OPN/OPM lineage, one for OPL/OPLL), the OPN detune ROM,
//! the OPM frequency-number ROM, and the OPL multiplier/KSL/LFO tables.

use std::sync::OnceLock;

/// Quarter-sine and exponential ROMs in the log-magnitude domain.
///
/// `logsin[i]` holds `-log2(sin((2i+1)/512 * pi/2)) * 256`, rounded;
/// `exp[i]` holds `2^(-(i+1)/256) * 2048`, rounded. Indexing and bit
/// widths follow the hardware ROMs, so the output stage can mask and
/// shift exactly the way the chips do.
pub struct WaveTables {
    /// Log-domain attenuation of the first quarter sine wave
    pub logsin: [u16; 256],
    /// Inverse table: fractional power of two, 11-bit mantissa
    pub exp: [u16; 256],
}

impl WaveTables {
    fn new() -> Self {
        let mut logsin = [0u16; 256];
        let mut exp = [0u16; 256];

        for (i, slot) in logsin.iter_mut().enumerate() {
            let phase = ((i << 1) + 1) as f64 / 512.0;
            let sine = (phase * std::f64::consts::FRAC_PI_2).sin();
            let attenuation = -sine.log2();
            *slot = (attenuation * 256.0 + 0.5) as u16;
        }

        for (i, slot) in exp.iter_mut().enumerate() {
            let fraction = (i + 1) as f64 / 256.0;
            let power = 2f64.powf(-fraction);
            *slot = (power * 2048.0 + 0.5) as u16;
        }

        WaveTables { logsin, exp }
    }
}

static WAVE_TABLES: OnceLock<WaveTables> = OnceLock::new();

/// Shared waveform ROMs, computed on first use.
pub fn wave_tables() -> &'static WaveTables {
    WAVE_TABLES.get_or_init(WaveTables::new)
}

/// Builds one algorithm descriptor word.
///
/// Bits 0, 1-3 and 4-6 select the modulation source fed into operators
/// 2, 3 and 4 (as an index into the router's partial-sum array); bits
/// 7-9 flag operators 1-3 as direct contributors to the channel output.
/// Operator 4 always contributes.
pub const fn algorithm_descriptor(
    op2_in: u16,
    op3_in: u16,
    op4_in: u16,
    op1_out: u16,
    op2_out: u16,
    op3_out: u16,
) -> u16 {
    op2_in | (op3_in << 1) | (op4_in << 4) | (op1_out << 7) | (op2_out << 8) | (op3_out << 9)
}

/// Routing descriptors for the eight 4-operator algorithms.
pub const ALGORITHM_COMBINATIONS: [u16; 8] = [
    algorithm_descriptor(1, 2, 3, 0, 0, 0), // 0: O1 -> O2 -> O3 -> O4
    algorithm_descriptor(0, 5, 3, 0, 0, 0), // 1: (O1 + O2) -> O3 -> O4
    algorithm_descriptor(0, 2, 6, 0, 0, 0), // 2: (O1 + (O2 -> O3)) -> O4
    algorithm_descriptor(1, 0, 7, 0, 0, 0), // 3: ((O1 -> O2) + O3) -> O4
    algorithm_descriptor(1, 0, 3, 0, 1, 0), // 4: (O1 -> O2) + (O3 -> O4)
    algorithm_descriptor(1, 1, 1, 0, 1, 1), // 5: O1 -> each of O2, O3, O4
    algorithm_descriptor(1, 0, 0, 0, 1, 1), // 6: (O1 -> O2) + O3 + O4
    algorithm_descriptor(0, 0, 0, 1, 1, 1), // 7: O1 + O2 + O3 + O4
];

/// Upper-fnum-bits to keycode fragment (OPN lineage).
pub const FNUM_TO_KEYCODE: [u8; 16] = [
    // F11 = 0
    0, 0, 0, 0, 0, 0, 0, 1, //
    // F11 = 1
    2, 3, 3, 3, 3, 3, 3, 3,
];

/// OPN/OPM detune increments, indexed by `[keycode][detune & 3]`.
pub const DETUNE_TABLE: [[u8; 4]; 32] = [
    [0, 0, 1, 2],   // keycode 0
    [0, 0, 1, 2],   //
    [0, 0, 1, 2],   //
    [0, 0, 1, 2],   //
    [0, 1, 2, 2],   // keycode 4
    [0, 1, 2, 3],   //
    [0, 1, 2, 3],   //
    [0, 1, 2, 3],   //
    [0, 1, 2, 4],   // keycode 8
    [0, 1, 3, 4],   //
    [0, 1, 3, 4],   //
    [0, 1, 3, 5],   //
    [0, 2, 4, 5],   // keycode 12
    [0, 2, 4, 6],   //
    [0, 2, 4, 6],   //
    [0, 2, 5, 7],   //
    [0, 2, 5, 8],   // keycode 16
    [0, 3, 6, 8],   //
    [0, 3, 6, 9],   //
    [0, 3, 7, 10],  //
    [0, 4, 8, 11],  // keycode 20
    [0, 4, 8, 12],  //
    [0, 4, 9, 13],  //
    [0, 5, 10, 14], //
    [0, 5, 11, 16], // keycode 24
    [0, 6, 12, 17], //
    [0, 6, 13, 19], //
    [0, 7, 14, 20], //
    [0, 8, 16, 22], // keycode 28
    [0, 8, 16, 22], //
    [0, 8, 16, 22], //
    [0, 8, 16, 22], //
];

/// OPM coarse-detune offsets in cents (per the YM2151 manual).
pub const DETUNE2_CENTS: [i32; 4] = [0, 600, 781, 950];

/// OPM frequency-number ROM: one octave in 1/64th-semitone steps.
pub const OPM_FREQNUMS: [u16; 768] = [
    1299, 1300, 1301, 1302, 1303, 1304, 1305, 1306, 1308, 1309, 1310, 1311, 1313, 1314, 1315, 1316,
    1318, 1319, 1320, 1321, 1322, 1323, 1324, 1325, 1327, 1328, 1329, 1330, 1332, 1333, 1334, 1335,
    1337, 1338, 1339, 1340, 1341, 1342, 1343, 1344, 1346, 1347, 1348, 1349, 1351, 1352, 1353, 1354,
    1356, 1357, 1358, 1359, 1361, 1362, 1363, 1364, 1366, 1367, 1368, 1369, 1371, 1372, 1373, 1374,
    1376, 1377, 1378, 1379, 1381, 1382, 1383, 1384, 1386, 1387, 1388, 1389, 1391, 1392, 1393, 1394,
    1396, 1397, 1398, 1399, 1401, 1402, 1403, 1404, 1406, 1407, 1408, 1409, 1411, 1412, 1413, 1414,
    1416, 1417, 1418, 1419, 1421, 1422, 1423, 1424, 1426, 1427, 1429, 1430, 1431, 1432, 1434, 1435,
    1437, 1438, 1439, 1440, 1442, 1443, 1444, 1445, 1447, 1448, 1449, 1450, 1452, 1453, 1454, 1455,
    1458, 1459, 1460, 1461, 1463, 1464, 1465, 1466, 1468, 1469, 1471, 1472, 1473, 1474, 1476, 1477,
    1479, 1480, 1481, 1482, 1484, 1485, 1486, 1487, 1489, 1490, 1492, 1493, 1494, 1495, 1497, 1498,
    1501, 1502, 1503, 1504, 1506, 1507, 1509, 1510, 1512, 1513, 1514, 1515, 1517, 1518, 1520, 1521,
    1523, 1524, 1525, 1526, 1528, 1529, 1531, 1532, 1534, 1535, 1536, 1537, 1539, 1540, 1542, 1543,
    1545, 1546, 1547, 1548, 1550, 1551, 1553, 1554, 1556, 1557, 1558, 1559, 1561, 1562, 1564, 1565,
    1567, 1568, 1569, 1570, 1572, 1573, 1575, 1576, 1578, 1579, 1580, 1581, 1583, 1584, 1586, 1587,
    1590, 1591, 1592, 1593, 1595, 1596, 1598, 1599, 1601, 1602, 1604, 1605, 1607, 1608, 1609, 1610,
    1613, 1614, 1615, 1616, 1618, 1619, 1621, 1622, 1624, 1625, 1627, 1628, 1630, 1631, 1632, 1633,
    1637, 1638, 1639, 1640, 1642, 1643, 1645, 1646, 1648, 1649, 1651, 1652, 1654, 1655, 1656, 1657,
    1660, 1661, 1663, 1664, 1666, 1667, 1669, 1670, 1672, 1673, 1675, 1676, 1678, 1679, 1681, 1682,
    1685, 1686, 1688, 1689, 1691, 1692, 1694, 1695, 1697, 1698, 1700, 1701, 1703, 1704, 1706, 1707,
    1709, 1710, 1712, 1713, 1715, 1716, 1718, 1719, 1721, 1722, 1724, 1725, 1727, 1728, 1730, 1731,
    1734, 1735, 1737, 1738, 1740, 1741, 1743, 1744, 1746, 1748, 1749, 1751, 1752, 1754, 1755, 1757,
    1759, 1760, 1762, 1763, 1765, 1766, 1768, 1769, 1771, 1773, 1774, 1776, 1777, 1779, 1780, 1782,
    1785, 1786, 1788, 1789, 1791, 1793, 1794, 1796, 1798, 1799, 1801, 1802, 1804, 1806, 1807, 1809,
    1811, 1812, 1814, 1815, 1817, 1819, 1820, 1822, 1824, 1825, 1827, 1828, 1830, 1832, 1833, 1835,
    1837, 1838, 1840, 1841, 1843, 1845, 1846, 1848, 1850, 1851, 1853, 1854, 1856, 1858, 1859, 1861,
    1864, 1865, 1867, 1868, 1870, 1872, 1873, 1875, 1877, 1879, 1880, 1882, 1884, 1885, 1887, 1888,
    1891, 1892, 1894, 1895, 1897, 1899, 1900, 1902, 1904, 1906, 1907, 1909, 1911, 1912, 1914, 1915,
    1918, 1919, 1921, 1923, 1925, 1926, 1928, 1930, 1932, 1933, 1935, 1937, 1939, 1940, 1942, 1944,
    1946, 1947, 1949, 1951, 1953, 1954, 1956, 1958, 1960, 1961, 1963, 1965, 1967, 1968, 1970, 1972,
    1975, 1976, 1978, 1980, 1982, 1983, 1985, 1987, 1989, 1990, 1992, 1994, 1996, 1997, 1999, 2001,
    2003, 2004, 2006, 2008, 2010, 2011, 2013, 2015, 2017, 2019, 2021, 2022, 2024, 2026, 2028, 2029,
    2032, 2033, 2035, 2037, 2039, 2041, 2043, 2044, 2047, 2048, 2050, 2052, 2054, 2056, 2058, 2059,
    2062, 2063, 2065, 2067, 2069, 2071, 2073, 2074, 2077, 2078, 2080, 2082, 2084, 2086, 2088, 2089,
    2092, 2093, 2095, 2097, 2099, 2101, 2103, 2104, 2107, 2108, 2110, 2112, 2114, 2116, 2118, 2119,
    2122, 2123, 2125, 2127, 2129, 2131, 2133, 2134, 2137, 2139, 2141, 2142, 2145, 2146, 2148, 2150,
    2153, 2154, 2156, 2158, 2160, 2162, 2164, 2165, 2168, 2170, 2172, 2173, 2176, 2177, 2179, 2181,
    2185, 2186, 2188, 2190, 2192, 2194, 2196, 2197, 2200, 2202, 2204, 2205, 2208, 2209, 2211, 2213,
    2216, 2218, 2220, 2222, 2223, 2226, 2227, 2230, 2232, 2234, 2236, 2238, 2239, 2242, 2243, 2246,
    2249, 2251, 2253, 2255, 2256, 2259, 2260, 2263, 2265, 2267, 2269, 2271, 2272, 2275, 2276, 2279,
    2281, 2283, 2285, 2287, 2288, 2291, 2292, 2295, 2297, 2299, 2301, 2303, 2304, 2307, 2308, 2311,
    2315, 2317, 2319, 2321, 2322, 2325, 2326, 2329, 2331, 2333, 2335, 2337, 2338, 2341, 2342, 2345,
    2348, 2350, 2352, 2354, 2355, 2358, 2359, 2362, 2364, 2366, 2368, 2370, 2371, 2374, 2375, 2378,
    2382, 2384, 2386, 2388, 2389, 2392, 2393, 2396, 2398, 2400, 2402, 2404, 2407, 2410, 2411, 2414,
    2417, 2419, 2421, 2423, 2424, 2427, 2428, 2431, 2433, 2435, 2437, 2439, 2442, 2445, 2446, 2449,
    2452, 2454, 2456, 2458, 2459, 2462, 2463, 2466, 2468, 2470, 2472, 2474, 2477, 2480, 2481, 2484,
    2488, 2490, 2492, 2494, 2495, 2498, 2499, 2502, 2504, 2506, 2508, 2510, 2513, 2516, 2517, 2520,
    2524, 2526, 2528, 2530, 2531, 2534, 2535, 2538, 2540, 2542, 2544, 2546, 2549, 2552, 2553, 2556,
    2561, 2563, 2565, 2567, 2568, 2571, 2572, 2575, 2577, 2579, 2581, 2583, 2586, 2589, 2590, 2593,
];

/// Envelope counter prescaler shifts for the OPN/OPM rate set.
pub const OPN_EG_SHIFT: [u8; 64] = [
    11, 11, 11, 11, //
    10, 10, 10, 10, //
    9, 9, 9, 9, //
    8, 8, 8, 8, //
    7, 7, 7, 7, //
    6, 6, 6, 6, //
    5, 5, 5, 5, //
    4, 4, 4, 4, //
    3, 3, 3, 3, //
    2, 2, 2, 2, //
    1, 1, 1, 1, //
    0, 0, 0, 0, //
    0, 0, 0, 0, //
    0, 0, 0, 0, //
    0, 0, 0, 0, //
    0, 0, 0, 0,
];

/// Attenuation increments per update cycle for the OPN/OPM rate set.
pub const OPN_EG_INCREMENT: [[u8; 8]; 64] = [
    [0, 0, 0, 0, 0, 0, 0, 0], // rates 0-1 never fire
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 0, 1, 0, 1], // rate 4
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1], // rates 8-47: the repeating group
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1], // rate 48: prescaler pinned at 1
    [1, 1, 1, 2, 1, 1, 1, 2],
    [1, 2, 1, 2, 1, 2, 1, 2],
    [1, 2, 2, 2, 1, 2, 2, 2],
    [2, 2, 2, 2, 2, 2, 2, 2], // rate 52
    [2, 2, 2, 4, 2, 2, 2, 4],
    [2, 4, 2, 4, 2, 4, 2, 4],
    [2, 4, 4, 4, 2, 4, 4, 4],
    [4, 4, 4, 4, 4, 4, 4, 4], // rate 56
    [4, 4, 4, 8, 4, 4, 4, 8],
    [4, 8, 4, 8, 4, 8, 4, 8],
    [4, 8, 8, 8, 4, 8, 8, 8],
    [8, 8, 8, 8, 8, 8, 8, 8], // rates 60-63
    [8, 8, 8, 8, 8, 8, 8, 8],
    [8, 8, 8, 8, 8, 8, 8, 8],
    [8, 8, 8, 8, 8, 8, 8, 8],
];

/// Envelope counter prescaler shifts for the OPL/OPLL rate set.
pub const OPL_EG_SHIFT: [u8; 64] = [
    12, 12, 12, 12, //
    11, 11, 11, 11, //
    10, 10, 10, 10, //
    9, 9, 9, 9, //
    8, 8, 8, 8, //
    7, 7, 7, 7, //
    6, 6, 6, 6, //
    5, 5, 5, 5, //
    4, 4, 4, 4, //
    3, 3, 3, 3, //
    2, 2, 2, 2, //
    1, 1, 1, 1, //
    0, 0, 0, 0, //
    0, 0, 0, 0, //
    0, 0, 0, 0, //
    0, 0, 0, 0,
];

/// Attenuation increments per update cycle for the OPL/OPLL rate set.
pub const OPL_EG_INCREMENT: [[u8; 8]; 64] = [
    [0, 0, 0, 0, 0, 0, 0, 0], // rates 0-3 never fire
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 1, 0, 1, 0, 1, 0, 1], // rates 4-51: the repeating group
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [0, 1, 0, 1, 1, 1, 0, 1],
    [0, 1, 1, 1, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1], // rate 52
    [1, 1, 1, 2, 1, 1, 1, 2],
    [1, 2, 1, 2, 1, 2, 1, 2],
    [1, 2, 2, 2, 1, 2, 2, 2],
    [2, 2, 2, 2, 2, 2, 2, 2], // rate 56
    [2, 2, 2, 4, 2, 2, 2, 4],
    [2, 4, 2, 4, 2, 4, 2, 4],
    [2, 4, 4, 4, 2, 4, 4, 4],
    [4, 4, 4, 4, 4, 4, 4, 4], // rates 60-63
    [4, 4, 4, 4, 4, 4, 4, 4],
    [4, 4, 4, 4, 4, 4, 4, 4],
    [4, 4, 4, 4, 4, 4, 4, 4],
];

/// OPL register-offset to slot-number mapping (-1 marks a hole).
pub const OPL_SLOT_ORDER: [i8; 32] = [
    0, 2, 4, 1, 3, 5, -1, -1, //
    6, 8, 10, 7, 9, 11, -1, -1, //
    12, 14, 16, 13, 15, 17, -1, -1, //
    -1, -1, -1, -1, -1, -1, -1, -1,
];

/// OPL/OPLL frequency multipliers, doubled (MUL=0 means one half).
pub const OPL_MULTIPLY: [u32; 16] = [
    1, 2, 4, 6, 8, 10, 12, 14, //
    16, 18, 20, 20, 24, 24, 30, 30,
];

/// OPL/OPLL key-scale-level factors indexed by the upper fnum bits.
pub const OPL_KSL: [u8; 16] = [
    112, 64, 48, 38, 32, 26, 22, 18, //
    16, 12, 10, 8, 6, 4, 2, 0,
];

/// OPL tremolo table; each entry holds for 64 LFO clocks.
pub const OPL_AM_TABLE: [u8; 210] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, //
    2, 2, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 3, //
    4, 4, 4, 4, 4, 4, 4, 4, 5, 5, 5, 5, 5, 5, 5, 5, //
    6, 6, 6, 6, 6, 6, 6, 6, 7, 7, 7, 7, 7, 7, 7, 7, //
    8, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 9, 9, 9, //
    10, 10, 10, 10, 10, 10, 10, 10, 11, 11, 11, 11, 11, 11, 11, 11, //
    12, 12, 12, 12, 12, 12, 12, 12, 13, 13, 13, 12, 12, 12, 12, 12, //
    12, 12, 12, 11, 11, 11, 11, 11, 11, 11, 11, 10, 10, 10, 10, 10, //
    10, 10, 10, 9, 9, 9, 9, 9, 9, 9, 9, 8, 8, 8, 8, 8, //
    8, 8, 8, 7, 7, 7, 7, 7, 7, 7, 7, 6, 6, 6, 6, 6, //
    6, 6, 6, 5, 5, 5, 5, 5, 5, 5, 5, 4, 4, 4, 4, 4, //
    4, 4, 4, 3, 3, 3, 3, 3, 3, 3, 3, 2, 2, 2, 2, 2, //
    2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, //
    0, 0,
];

/// OPL vibrato offsets indexed by `[fnum >> 7 & 7][lfo phase]`.
pub const OPL_PM_TABLE: [[i8; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 1, 0, 0, 0, -1, 0],
    [0, 1, 2, 1, 0, -1, -2, -1],
    [0, 1, 3, 1, 0, -1, -3, -1],
    [0, 2, 4, 2, 0, -2, -4, -2],
    [0, 2, 5, 2, 0, -2, -5, -2],
    [0, 3, 6, 3, 0, -3, -6, -3],
    [0, 3, 7, 3, 0, -3, -7, -3],
];
